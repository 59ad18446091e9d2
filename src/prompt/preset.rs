//! 预设应用

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use regex::Regex;
use serde_json::{Map, Value};

use crate::{error::Error, utils::options::is_control};

/// 锁定时强制使用预设值的字段
pub const LOCKED_FIELDS: [&str; 6] = [
    "pose",
    "background",
    "mood",
    "time_of_day",
    "weather",
    "color_scheme",
];

/// preset_colors 关闭时从服装描述中移除的颜色词
const COLOR_WORDS: [&str; 24] = [
    "red", "blue", "green", "yellow", "orange", "purple", "pink", "black", "white", "gray",
    "grey", "brown", "beige", "navy", "gold", "golden", "silver", "teal", "burgundy", "maroon",
    "ivory", "cream", "lavender", "turquoise",
];

/// 从预设名称中随机选择一个, 相同种子得到相同结果
pub fn pick_preset(presets: &BTreeMap<String, Map<String, Value>>, seed: u64) -> Option<String> {
    if presets.is_empty() {
        return None;
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let index = rng.random_range(0..presets.len());
    presets.keys().nth(index).cloned()
}

/// 将预设写入输入
///
/// 只填充当前为控制值的字段; `lock` 为 true 时 [`LOCKED_FIELDS`] 总是使用预设值
pub fn apply_preset(inputs: &mut Map<String, Value>, preset: &Map<String, Value>, lock: bool) {
    for (field, value) in preset {
        let current = inputs.get(field).and_then(Value::as_str).unwrap_or_default();
        let locked = lock && LOCKED_FIELDS.contains(&field.as_str());
        if locked || is_control(current.trim()) {
            inputs.insert(field.clone(), value.clone());
        }
    }
}

/// 移除预设服装字段中的颜色词
pub fn strip_preset_colors(
    preset: &Map<String, Value>,
    body_parts: &[String],
) -> Result<Map<String, Value>, Error> {
    let pattern = format!(r"(?i)\b(?:{})\b", COLOR_WORDS.join("|"));
    let re_color = Regex::new(&pattern)?;
    let re_spaces = Regex::new(r"\s{2,}")?;

    let stripped = preset
        .iter()
        .map(|(field, value)| {
            let value = match value {
                Value::String(text) if body_parts.contains(field) => {
                    let text = re_color.replace_all(text, "");
                    Value::String(re_spaces.replace_all(text.trim(), " ").to_string())
                }
                _ => value.clone(),
            };
            (field.clone(), value)
        })
        .collect();
    Ok(stripped)
}
