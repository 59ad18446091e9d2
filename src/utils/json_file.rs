//! JSON 文件读取

use std::{collections::BTreeMap, fs, path::Path};

use log::warn;
use serde_json::Value;

use crate::error::Error;

/// 读取并解析 JSON 文件
pub fn read_json_file(path: &Path) -> Result<Value, Error> {
    if !path.is_file() {
        return Err(Error::FileNotFound(path.display().to_string()));
    }
    let content = fs::read_to_string(path)?;
    let value = serde_json::from_str(&content)?;
    Ok(value)
}

/// 读取 JSON 文件, 失败时记录日志并返回 None
pub fn load_json_file(path: &Path) -> Option<Value> {
    match read_json_file(path) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("error loading {}, {e}", path.display());
            None
        }
    }
}

/// 读取对象中的字符串列表, 非字符串元素会被忽略
pub fn string_list(value: &Value, key: &str) -> Option<Vec<String>> {
    let list = value.get(key)?.as_array()?;
    Some(
        list.iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect(),
    )
}

/// 读取字符串映射, 非字符串值会被忽略; `key` 为 None 时读取顶层对象
pub fn string_map(value: &Value, key: Option<&str>) -> Option<BTreeMap<String, String>> {
    let obj = match key {
        Some(key) => value.get(key)?,
        None => value,
    }
    .as_object()?;
    Some(
        obj.iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
            .collect(),
    )
}
