//! 提示词构建
//!
//! 按固定顺序输出带标签的片段, 以 ", " 连接:
//! Character, Age, Race, Body type, Attire, Makeup, Pose, Background,
//! Mood, Time, Weather, Color scheme, Style, Scale, Additional
//!
//! "random" 选项使用种子确定的随机数生成器选择, 相同种子得到相同结果。

use std::collections::{BTreeMap, HashSet};

use log::warn;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::{json, Map, Value};

use crate::{
    makeup::{describe_legacy_widgets, describe_serialized},
    utils::options::{safe_random_choice, OPTION_NONE, OPTION_RANDOM},
};

/// 角色信息字段
const CHARACTER_FIELDS: [(&str, &str); 3] = [
    ("age_group", "Age"),
    ("race", "Race"),
    ("body_type", "Body type"),
];

/// 场景与风格字段
const SCENE_FIELDS: [(&str, &str); 8] = [
    ("pose", "Pose"),
    ("background", "Background"),
    ("mood", "Mood"),
    ("time_of_day", "Time"),
    ("weather", "Weather"),
    ("color_scheme", "Color scheme"),
    ("description_style", "Style"),
    ("creative_scale", "Scale"),
];

/// 基础负面提示词
const BASE_NEGATIVE: [&str; 6] = [
    "low-res",
    "blurry",
    "bad anatomy",
    "extra fingers",
    "watermark",
    "text",
];

/// 选择值与之冲突的负面提示词
const CONFLICT_NEGATIVE: [(&str, &[&str]); 5] = [
    ("clean shaven", &["beard", "mustache", "stubble"]),
    ("no eyewear", &["glasses", "sunglasses"]),
    ("shaved head", &["long hair"]),
    ("bald", &["long hair"]),
    ("barefoot", &["shoes", "socks"]),
];

pub struct PromptBuilder {
    seed: u64,
    rng: ChaCha8Rng,
    data: Map<String, Value>,
    options: BTreeMap<String, Vec<String>>,
    parts: Vec<String>,
    selections: BTreeMap<String, String>,
    makeup: Vec<String>,
}

impl PromptBuilder {
    pub fn new(seed: u64, data: Map<String, Value>, options: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            data,
            options,
            parts: Vec::new(),
            selections: BTreeMap::new(),
            makeup: Vec::new(),
        }
    }

    /// 构建正面提示词
    pub fn build(&mut self, body_parts: &[String]) -> String {
        self.parts.clear();
        self.selections.clear();
        self.makeup.clear();

        let character_name = self.text("character_name");
        if !character_name.is_empty() {
            self.parts.push(format!("Character: {character_name}"));
        }

        for (field, label) in CHARACTER_FIELDS {
            self.push_field(field, label);
        }

        let attire = body_parts
            .iter()
            .filter(|part| part.as_str() != "makeup")
            .filter_map(|part| self.resolve(part).map(|value| format!("{part}: {value}")))
            .collect::<Vec<_>>();
        if !attire.is_empty() {
            self.parts.push(format!("Attire: {}", attire.join(", ")));
        }

        self.makeup = self.makeup_parts();
        if !self.makeup.is_empty() {
            self.parts.push(format!("Makeup: {}", self.makeup.join(", ")));
        }

        for (field, label) in SCENE_FIELDS {
            self.push_field(field, label);
        }

        let custom_attributes = self.text("custom_attributes");
        if !custom_attributes.is_empty() {
            self.parts.push(format!("Additional: {custom_attributes}"));
        }

        self.parts.join(", ")
    }

    /// 负面提示词: 基础词 + 与选择冲突的词 + avoid_terms, 忽略大小写去重
    pub fn negative_prompt(&self) -> String {
        let mut terms: Vec<String> = BASE_NEGATIVE.iter().map(|s| s.to_string()).collect();

        for value in self.selections.values() {
            let value = value.to_lowercase();
            for (trigger, negatives) in CONFLICT_NEGATIVE {
                if value.contains(trigger) {
                    terms.extend(negatives.iter().map(|s| s.to_string()));
                }
            }
        }

        terms.extend(
            self.text("avoid_terms")
                .split([',', '\n'])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string()),
        );

        let mut seen = HashSet::new();
        terms
            .into_iter()
            .filter(|term| seen.insert(term.to_lowercase()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// 最近一次构建的选择结果
    pub fn metadata(&self) -> Value {
        json!({
            "seed": self.seed,
            "selections": self.selections,
            "makeup": self.makeup,
        })
    }

    fn push_field(&mut self, field: &str, label: &str) {
        if let Some(value) = self.resolve(field) {
            self.parts.push(format!("{label}: {value}"));
        }
    }

    /// 解析字段值, "random" 从选项中随机选择, 空值与 "none" 返回 None
    fn resolve(&mut self, field: &str) -> Option<String> {
        let mut value = self.text(field);
        if value.is_empty() || value == OPTION_NONE {
            return None;
        }

        if value == OPTION_RANDOM {
            let options = self.options.get(field).map(Vec::as_slice).unwrap_or_default();
            value = safe_random_choice(&mut self.rng, options);
            if value == OPTION_NONE {
                return None;
            }
        }

        self.selections.insert(field.to_string(), value.clone());
        Some(value)
    }

    fn makeup_parts(&self) -> Vec<String> {
        let parts = match describe_serialized(&self.text("makeup_data")) {
            Ok(parts) => parts,
            Err(e) => {
                warn!("error parsing makeup data, {e}");
                Vec::new()
            }
        };
        if !parts.is_empty() {
            return parts;
        }
        describe_legacy_widgets(&self.data)
    }

    /// 字段文本, 数字会被转换为字符串
    fn text(&self, field: &str) -> String {
        match self.data.get(field) {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }
}
