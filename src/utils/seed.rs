//! 种子模式

use strum_macros::{Display, EnumIter, EnumString};

/// 种子取值上限 (不含), 2**32
const SEED_MODULUS: u64 = 1 << 32;

/// 种子的变化方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum SeedMode {
    /// 使用输入值
    Fixed,
    /// 每次随机
    #[default]
    Random,
    /// 在上一次的基础上加一
    Increment,
    /// 在上一次的基础上减一
    Decrement,
}

impl SeedMode {
    /// 未知模式按 fixed 处理
    pub fn parse_or_fixed(mode: &str) -> Self {
        mode.parse().unwrap_or_else(|_| {
            log::warn!("unknown seed mode {mode:?}, fallback to fixed");
            SeedMode::Fixed
        })
    }

    /// 计算本次使用的种子
    ///
    /// `last_seed` 为 0 时 increment / decrement 退化为使用 `seed`
    pub fn resolve(&self, seed: u64, last_seed: u64) -> u64 {
        match self {
            SeedMode::Fixed => seed,
            SeedMode::Random => rand::random::<u32>() as u64,
            SeedMode::Increment if last_seed != 0 => (last_seed + 1) % SEED_MODULUS,
            SeedMode::Decrement if last_seed != 0 => (last_seed + SEED_MODULUS - 1) % SEED_MODULUS,
            SeedMode::Increment | SeedMode::Decrement => seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_seed_modes() {
        assert_eq!(SeedMode::Fixed.resolve(789, 0), 789);
        assert_eq!(SeedMode::Fixed.resolve(789, 5), 789);
        assert_eq!(SeedMode::Increment.resolve(100, 100), 101);
        assert_eq!(SeedMode::Increment.resolve(100, 0), 100);
        assert_eq!(SeedMode::Increment.resolve(0, 0xffff_ffff), 0);
        assert_eq!(SeedMode::Decrement.resolve(100, 100), 99);
        assert_eq!(SeedMode::Decrement.resolve(42, 0), 42);
        assert_eq!(SeedMode::Decrement.resolve(0, 1), 0);
        assert!(SeedMode::Random.resolve(0, 0) < SEED_MODULUS);
    }

    #[test]
    fn test_parse_seed_mode() {
        assert_eq!(SeedMode::parse_or_fixed("increment"), SeedMode::Increment);
        assert_eq!(SeedMode::parse_or_fixed("sideways"), SeedMode::Fixed);
        let names = SeedMode::iter().map(|m| m.to_string()).collect::<Vec<_>>();
        assert_eq!(names, vec!["fixed", "random", "increment", "decrement"]);
    }
}
