//! 化妆编辑器与序列化结果解析

use pyo3::{
    types::{PyModule, PyModuleMethods},
    Bound, PyResult, Python,
};
use serde_json::{Map, Value};

use crate::{core::node::NodeRegister, error::Error, utils::options::OPTION_NONE};

pub mod diagnostics;
pub mod editor;
pub mod item;
pub mod vocabulary;

mod makeup_editor_node;
pub use makeup_editor_node::MakeupEditorNode;

use item::Intensity;

/// 化妆模块
pub fn submodule(py: Python<'_>) -> PyResult<Bound<'_, PyModule>> {
    let submodule = PyModule::new(py, "makeup")?;
    submodule.add_class::<MakeupEditorNode>()?;
    Ok(submodule)
}

/// 化妆模块节点注册
pub fn node_register(py: Python<'_>) -> PyResult<Vec<NodeRegister<'_>>> {
    let nodes: Vec<NodeRegister> = vec![NodeRegister(
        "MakeupEditor",
        py.get_type::<MakeupEditorNode>(),
        "💄 Makeup Editor",
    )];
    Ok(nodes)
}

/// 将编辑器的序列化结果转换为提示词片段
///
/// - 有颜色: `lipstick (red, heavy)`
/// - 无颜色: `lipstick (medium)`
///
/// 禁用的条目、type 为空或 "none" 的条目、非对象元素会被跳过
pub fn describe_serialized(serialized: &str) -> Result<Vec<String>, Error> {
    let serialized = serialized.trim();
    if serialized.is_empty() {
        return Ok(Vec::new());
    }

    let values: Vec<Value> = serde_json::from_str(serialized)?;
    let parts = values
        .iter()
        .filter_map(Value::as_object)
        .filter_map(describe_entry)
        .collect();
    Ok(parts)
}

fn describe_entry(entry: &Map<String, Value>) -> Option<String> {
    let enabled = entry.get("enabled").and_then(Value::as_bool).unwrap_or(true);
    if !enabled {
        return None;
    }

    let makeup_type = entry
        .get("type")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty() && *t != OPTION_NONE)?;
    let default_intensity = Intensity::default().to_string();
    let intensity = entry
        .get("intensity")
        .and_then(Value::as_str)
        .unwrap_or(default_intensity.as_str());
    let color = entry.get("color").and_then(Value::as_str).unwrap_or(OPTION_NONE);

    if !color.is_empty() && color != OPTION_NONE {
        Some(format!("{makeup_type} ({color}, {intensity})"))
    } else {
        Some(format!("{makeup_type} ({intensity})"))
    }
}

/// 旧版界面以独立控件保存化妆条目: `makeup_<n>_type`, `makeup_<n>_intensity`, `makeup_<n>_enabled`
///
/// 按 n 的数值排序, n 不是整数的控件会被忽略
pub fn describe_legacy_widgets(inputs: &Map<String, Value>) -> Vec<String> {
    let mut slots = inputs
        .keys()
        .filter_map(|k| {
            let base = k.strip_suffix("_type")?;
            let n = base.strip_prefix("makeup_")?.parse::<u32>().ok()?;
            Some((n, base))
        })
        .collect::<Vec<_>>();
    slots.sort_unstable();

    slots
        .into_iter()
        .filter_map(|(_, base)| {
            let makeup_type = inputs.get(&format!("{base}_type")).and_then(Value::as_str)?;
            if makeup_type.is_empty() || makeup_type == OPTION_NONE {
                return None;
            }
            let enabled = inputs
                .get(&format!("{base}_enabled"))
                .and_then(Value::as_bool)
                .unwrap_or(true);
            if !enabled {
                return None;
            }
            let default_intensity = Intensity::default().to_string();
            let intensity = inputs
                .get(&format!("{base}_intensity"))
                .and_then(Value::as_str)
                .unwrap_or(default_intensity.as_str());
            Some(format!("{makeup_type} ({intensity})"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_describe_serialized() -> anyhow::Result<()> {
        let parts = describe_serialized(
            r#"[
                {"type": "lipstick", "intensity": "heavy", "color": "red", "enabled": true},
                {"type": "mascara"},
                {"type": "blush", "enabled": false},
                {"type": "none", "color": "pink"},
                "eyeliner",
                {"intensity": "light"}
            ]"#,
        )?;
        assert_eq!(parts, vec!["lipstick (red, heavy)", "mascara (medium)"]);

        assert!(describe_serialized("")?.is_empty());
        assert!(describe_serialized("[]")?.is_empty());
        assert!(describe_serialized("{not json").is_err());
        Ok(())
    }

    #[test]
    fn test_describe_legacy_widgets() {
        let inputs = json!({
            "makeup_2_type": "eyeliner",
            "makeup_2_enabled": false,
            "makeup_1_type": "lipstick",
            "makeup_1_intensity": "light",
            "makeup_3_type": "blush",
            "makeup_4_type": "none",
            "pose": "standing",
        });
        let inputs = inputs.as_object().cloned().unwrap_or_default();
        assert_eq!(
            describe_legacy_widgets(&inputs),
            vec!["lipstick (light)", "blush (medium)"]
        );
    }

    #[test]
    fn test_legacy_widgets_numeric_order() {
        let mut inputs = Map::new();
        for n in 1..=12 {
            inputs.insert(format!("makeup_{n}_type"), json!(format!("type{n}")));
        }
        inputs.insert("makeup_x_type".to_string(), json!("ignored"));

        let expected = (1..=12)
            .map(|n| format!("type{n} (medium)"))
            .collect::<Vec<_>>();
        assert_eq!(describe_legacy_widgets(&inputs), expected);
    }
}
