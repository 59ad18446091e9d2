//! 服装数据加载
//!
//! 数据目录结构:
//! ```text
//! data/
//!   backgrounds.json  race.json  age_groups.json  presets.json
//!   styles/scene_highlights.json  styles/description_styles.json  styles/scale.json
//!   styles/scale_instructions.json  styles/creative_modes.json
//!   outfit/<gender>/<body_part>.json  body_type.json  poses.json  makeup.json
//! ```
//!
//! 所有加载函数都不会失败, 文件缺失或格式错误时返回默认选项并记录日志。

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use log::warn;
use serde_json::{Map, Value};
use walkdir::WalkDir;

use crate::utils::{
    json_file::{load_json_file, string_list, string_map},
    options::{control_options, filter_valid_options},
};

/// 不属于身体部位的文件
const EXCLUDED_PART_FILES: [&str; 3] = ["body_type.json", "poses.json", "makeup.json"];

/// 预设: gender -> preset name -> field -> value
pub type Presets = BTreeMap<String, BTreeMap<String, Map<String, Value>>>;

/// 场景相关选项
#[derive(Debug, Clone, PartialEq)]
pub struct SceneHighlights {
    pub moods: Vec<String>,
    pub times: Vec<String>,
    pub weather: Vec<String>,
    pub color_schemes: Vec<String>,
}

impl Default for SceneHighlights {
    fn default() -> Self {
        Self {
            moods: control_options(),
            times: control_options(),
            weather: control_options(),
            color_schemes: control_options(),
        }
    }
}

/// 默认创作模式
pub const CREATIVE_MODE_STANDARD: &str = "standard";

/// 创作模式
#[derive(Debug, Clone, PartialEq)]
pub struct CreativeModes {
    pub modes: Vec<String>,
    /// mode -> 模型指令
    pub instructions: BTreeMap<String, String>,
}

impl Default for CreativeModes {
    fn default() -> Self {
        Self {
            modes: vec![CREATIVE_MODE_STANDARD.to_string()],
            instructions: BTreeMap::new(),
        }
    }
}

/// 读取 attire 列表中的类型
///
/// 元素可以是 `{"type": ...}` 对象, 也可以是字符串;
/// attire 缺失或不是列表时返回 None
pub fn attire_types(doc: &Value) -> Option<Vec<String>> {
    let items = doc.get("attire")?.as_array()?;
    let types = items
        .iter()
        .filter_map(|item| match item {
            Value::Object(obj) => obj.get("type").and_then(Value::as_str),
            Value::String(s) => Some(s.as_str()),
            _ => None,
        })
        .map(|s| s.to_string())
        .collect();
    Some(types)
}

/// 发现 outfit 目录下的性别文件夹
pub fn discover_genders(outfit_dir: &Path) -> Vec<String> {
    if !outfit_dir.is_dir() {
        warn!("outfit data directory not found: {}", outfit_dir.display());
        return Vec::new();
    }

    let mut genders = WalkDir::new(outfit_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect::<Vec<_>>();
    genders.sort();
    genders
}

/// 发现性别目录下的身体部位
pub fn discover_body_parts(gender_dir: &Path) -> Vec<String> {
    if !gender_dir.is_dir() {
        return Vec::new();
    }

    let mut parts = WalkDir::new(gender_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .filter(|path| {
            path.file_name()
                .is_some_and(|name| !EXCLUDED_PART_FILES.iter().any(|ex| name == *ex))
        })
        .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().to_string()))
        .collect::<Vec<_>>();
    parts.sort();
    parts
}

/// 加载每个身体部位的服装选项
pub fn load_outfit_data(gender_dir: &Path, body_parts: &[String]) -> BTreeMap<String, Vec<String>> {
    body_parts
        .iter()
        .map(|part| {
            let path = gender_dir.join(format!("{part}.json"));
            let options = load_json_file(&path)
                .and_then(|doc| attire_types(&doc))
                .map(filter_valid_options)
                .unwrap_or_else(control_options);
            (part.clone(), options)
        })
        .collect()
}

/// 从 JSON 文件中加载全局选项
pub fn load_global_options(dir: &Path, filename: &str, key: &str) -> Vec<String> {
    load_json_file(&dir.join(filename))
        .and_then(|doc| string_list(&doc, key))
        .map(filter_valid_options)
        .unwrap_or_else(control_options)
}

/// 加载体型
pub fn load_body_types(gender_dir: &Path) -> Vec<String> {
    load_json_file(&gender_dir.join("body_type.json"))
        .and_then(|doc| attire_types(&doc))
        .map(filter_valid_options)
        .unwrap_or_else(control_options)
}

/// 加载场景选项
pub fn load_scene_highlights(styles_dir: &Path) -> SceneHighlights {
    let Some(doc) = load_json_file(&styles_dir.join("scene_highlights.json")) else {
        return SceneHighlights::default();
    };

    let options = |key: &str| {
        string_list(&doc, key)
            .map(filter_valid_options)
            .unwrap_or_else(control_options)
    };
    SceneHighlights {
        moods: options("moods"),
        times: options("times"),
        weather: options("weather"),
        color_schemes: options("color_schemes"),
    }
}

/// 加载描述风格
pub fn load_description_styles(styles_dir: &Path) -> Vec<String> {
    load_global_options(styles_dir, "description_styles.json", "styles")
}

/// 加载细节程度
pub fn load_scale_options(styles_dir: &Path) -> Vec<String> {
    load_global_options(styles_dir, "scale.json", "scales")
}

/// 加载细节程度对应的模型指令
pub fn load_scale_instructions(styles_dir: &Path) -> BTreeMap<String, String> {
    load_json_file(&styles_dir.join("scale_instructions.json"))
        .and_then(|doc| string_map(&doc, None))
        .unwrap_or_default()
}

/// 加载创作模式及其模型指令, 缺失时只有 "standard"
pub fn load_creative_modes(styles_dir: &Path) -> CreativeModes {
    let Some(doc) = load_json_file(&styles_dir.join("creative_modes.json")) else {
        return CreativeModes::default();
    };

    let mut modes = string_list(&doc, "modes")
        .unwrap_or_default()
        .into_iter()
        .filter(|m| !m.trim().is_empty())
        .collect::<Vec<_>>();
    if modes.is_empty() {
        modes.push(CREATIVE_MODE_STANDARD.to_string());
    }
    CreativeModes {
        modes,
        instructions: string_map(&doc, Some("instructions")).unwrap_or_default(),
    }
}

/// 加载预设, 格式不正确的条目会被忽略
pub fn load_presets(data_dir: &Path) -> Presets {
    let mut presets = Presets::new();
    let Some(Value::Object(doc)) = load_json_file(&data_dir.join("presets.json")) else {
        return presets;
    };

    for (gender, gender_presets) in doc {
        let Value::Object(gender_presets) = gender_presets else {
            warn!("presets for {gender} is not an object, skipped");
            continue;
        };
        let entries = gender_presets
            .into_iter()
            .filter_map(|(name, preset)| match preset {
                Value::Object(fields) => Some((name, fields)),
                _ => {
                    warn!("preset {name} is not an object, skipped");
                    None
                }
            })
            .collect();
        presets.insert(gender, entries);
    }
    presets
}

/// 校验必需的数据文件存在且为合法 JSON
pub fn validate_data_integrity(data_dir: &Path, required_files: &[&str]) -> bool {
    required_files.iter().all(|filename| {
        let path: PathBuf = data_dir.join(filename);
        if !path.exists() {
            warn!("missing required file: {filename}");
            return false;
        }
        load_json_file(&path).is_some()
    })
}
