//! 化妆词表
//!
//! 词表来自 `data/outfit/<gender>/makeup.json`:
//! ```json
//! {
//!     "attire": [{"type": "lipstick"}, {"type": "blush"}],
//!     "colors": ["none", "red", "pink"],
//!     "intensities": ["none", "light", "medium", "heavy"]
//! }
//! ```
//! 解析分两步: [`Vocabulary::try_fetch`] 读取数据源, 失败时由 [`Vocabulary::use_default`]
//! 提供内置词表, 保证离线时编辑器仍可用。

use std::path::{Path, PathBuf};

use serde_json::Value;
use strum::IntoEnumIterator;

use super::{
    diagnostics::DiagnosticSink,
    item::{Intensity, MakeupField},
};
use crate::{
    error::Error,
    utils::{
        data_loader::attire_types,
        json_file::{read_json_file, string_list},
        options::OPTION_NONE,
    },
};

const DEFAULT_TYPES: [&str; 14] = [
    "none",
    "foundation",
    "concealer",
    "blush",
    "bronzer",
    "highlighter",
    "contour",
    "eyeshadow",
    "eyeliner",
    "mascara",
    "eyebrows",
    "lipstick",
    "lip gloss",
    "lip liner",
];

const DEFAULT_COLORS: [&str; 15] = [
    "none", "natural", "nude", "pink", "red", "coral", "berry", "plum", "brown", "bronze", "gold",
    "silver", "black", "blue", "purple",
];

/// 词表数据源
pub trait VocabularySource {
    /// 读取原始词表文档
    fn fetch(&self) -> Result<Value, Error>;

    /// 数据源描述, 用于日志
    fn describe(&self) -> String;
}

/// 从 JSON 文件读取
#[derive(Debug, Clone)]
pub struct FileVocabularySource {
    path: PathBuf,
}

impl FileVocabularySource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// 指定性别的 makeup.json
    pub fn for_gender(outfit_dir: &Path, gender: &str) -> Self {
        Self::new(outfit_dir.join(gender).join("makeup.json"))
    }
}

impl VocabularySource for FileVocabularySource {
    fn fetch(&self) -> Result<Value, Error> {
        read_json_file(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// 内存中的词表文档
#[derive(Debug, Clone)]
pub struct StaticVocabularySource(pub Value);

impl VocabularySource for StaticVocabularySource {
    fn fetch(&self) -> Result<Value, Error> {
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        "static document".to_string()
    }
}

/// 各字段可选值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    pub types: Vec<String>,
    pub intensities: Vec<String>,
    pub colors: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::use_default()
    }
}

impl Vocabulary {
    /// 内置词表
    pub fn use_default() -> Self {
        Self {
            types: DEFAULT_TYPES.iter().map(|s| s.to_string()).collect(),
            intensities: Intensity::iter().map(|i| i.to_string()).collect(),
            colors: DEFAULT_COLORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// 从数据源读取词表, 文档结构不正确时返回 [`Error::MalformedDocument`]
    pub fn try_fetch(source: &dyn VocabularySource) -> Result<Self, Error> {
        let doc = source.fetch()?;
        Self::from_document(&doc)
    }

    /// 读取失败时退回内置词表, 并输出警告
    pub fn resolve(source: &dyn VocabularySource, sink: &dyn DiagnosticSink) -> Self {
        match Self::try_fetch(source) {
            Ok(vocabulary) => vocabulary,
            Err(e) => {
                sink.warn(&format!(
                    "makeup vocabulary from {} unavailable, using built-in defaults: {e}",
                    source.describe()
                ));
                Self::use_default()
            }
        }
    }

    pub fn from_document(doc: &Value) -> Result<Self, Error> {
        let types = attire_types(doc)
            .ok_or_else(|| Error::MalformedDocument("missing attire list".to_string()))?;
        let types = with_none(types);
        if types.len() == 1 {
            return Err(Error::MalformedDocument("attire list has no types".to_string()));
        }

        let colors = match doc.get("colors") {
            None => with_none(Vec::new()),
            Some(_) => with_none(
                string_list(doc, "colors")
                    .ok_or_else(|| Error::MalformedDocument("colors is not a list".to_string()))?,
            ),
        };

        let intensities = match doc.get("intensities") {
            None => Intensity::iter().map(|i| i.to_string()).collect(),
            Some(_) => with_none(string_list(doc, "intensities").ok_or_else(|| {
                Error::MalformedDocument("intensities is not a list".to_string())
            })?),
        };

        Ok(Self {
            types,
            intensities,
            colors,
        })
    }

    /// 字符串字段的可选值, enabled 字段返回 None
    pub fn values(&self, field: MakeupField) -> Option<&[String]> {
        match field {
            MakeupField::Enabled => None,
            MakeupField::Type => Some(&self.types),
            MakeupField::Intensity => Some(&self.intensities),
            MakeupField::Color => Some(&self.colors),
        }
    }

    /// 值是否在词表中, enabled 字段始终为 true
    pub fn contains(&self, field: MakeupField, value: &str) -> bool {
        self.values(field)
            .map(|values| values.iter().any(|v| v == value))
            .unwrap_or(true)
    }
}

/// 去掉空值与重复的 "none", 并保证 "none" 在第一位
fn with_none(values: Vec<String>) -> Vec<String> {
    let mut results = vec![OPTION_NONE.to_string()];
    for value in values {
        if value.is_empty() || results.contains(&value) {
            continue;
        }
        results.push(value);
    }
    results
}
