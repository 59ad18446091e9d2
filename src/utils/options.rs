//! 选项列表处理
//!
//! 下拉框选项统一以 "none", "random" 两个控制值开头

use rand::Rng;

pub const OPTION_NONE: &str = "none";
pub const OPTION_RANDOM: &str = "random";

/// 是否为控制值 (空字符串 / none / random)
pub fn is_control(value: &str) -> bool {
    value.is_empty() || value == OPTION_NONE || value == OPTION_RANDOM
}

/// 控制值选项
pub fn control_options() -> Vec<String> {
    vec![OPTION_NONE.to_string(), OPTION_RANDOM.to_string()]
}

/// 过滤控制值与空字符串, 并在头部加上 "none", "random"
pub fn filter_valid_options<I, S>(options: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut results = control_options();
    results.extend(
        options
            .into_iter()
            .map(Into::into)
            .filter(|opt| !is_control(opt)),
    );
    results
}

/// 从有效选项中随机选择一个, 没有有效选项时返回 "none"
pub fn safe_random_choice<R: Rng>(rng: &mut R, options: &[String]) -> String {
    let valid = options
        .iter()
        .filter(|opt| !is_control(opt))
        .collect::<Vec<_>>();
    if valid.is_empty() {
        return OPTION_NONE.to_string();
    }

    let index = rng.random_range(0..valid.len());
    valid[index].clone()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_filter_valid_options() {
        let options = filter_valid_options(["jeans", "", "random", "shorts", "none"]);
        assert_eq!(options, strings(&["none", "random", "jeans", "shorts"]));

        let empty: Vec<String> = vec![];
        assert_eq!(filter_valid_options(empty), strings(&["none", "random"]));
    }

    #[test]
    fn test_safe_random_choice() {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(7);
        let options = strings(&["none", "random", "hoodie", "jacket"]);
        for _ in 0..20 {
            let choice = safe_random_choice(&mut rng, &options);
            assert!(choice == "hoodie" || choice == "jacket");
        }

        let only_control = strings(&["none", "random"]);
        assert_eq!(safe_random_choice(&mut rng, &only_control), "none");
        assert_eq!(safe_random_choice(&mut rng, &[]), "none");
    }

    #[test]
    fn test_safe_random_choice_deterministic() {
        let options = strings(&["a", "b", "c", "d", "e"]);
        let mut rng1 = rand_chacha::ChaCha8Rng::seed_from_u64(999);
        let mut rng2 = rand_chacha::ChaCha8Rng::seed_from_u64(999);
        let picks1 = (0..5)
            .map(|_| safe_random_choice(&mut rng1, &options))
            .collect::<Vec<_>>();
        let picks2 = (0..5)
            .map(|_| safe_random_choice(&mut rng2, &options))
            .collect::<Vec<_>>();
        assert_eq!(picks1, picks2);
    }
}
