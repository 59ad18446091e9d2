//! 化妆条目

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::{error::Error, utils::options::OPTION_NONE};

/// 化妆浓度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Intensity {
    None,
    Light,
    #[default]
    Medium,
    Heavy,
}

/// 条目可编辑的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum MakeupField {
    Enabled,
    Type,
    Intensity,
    Color,
}

/// 字段取值, enabled 为布尔值, 其余字段为字符串
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Bool(bool),
    Text(String),
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

/// 编辑器中的一行化妆选择
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MakeupItem {
    pub id: u64,
    pub enabled: bool,
    pub r#type: String,
    pub intensity: String,
    pub color: String,
}

impl MakeupItem {
    /// 使用默认值创建条目
    pub fn new(id: u64) -> Self {
        Self {
            id,
            enabled: true,
            r#type: OPTION_NONE.to_string(),
            intensity: Intensity::default().to_string(),
            color: OPTION_NONE.to_string(),
        }
    }

    /// 复制四个可编辑字段到新的 id
    pub fn duplicate(&self, id: u64) -> Self {
        Self { id, ..self.clone() }
    }

    /// 是否输出到序列化结果
    pub fn is_active(&self) -> bool {
        self.enabled && self.r#type != OPTION_NONE
    }

    /// 修改字段, 返回被修改的字段
    ///
    /// 字符串值不做词表校验
    pub fn set_field(&mut self, field: &str, value: FieldValue) -> Result<MakeupField, Error> {
        let field: MakeupField = field
            .parse()
            .map_err(|_| Error::InvalidField(format!("unknown field {field:?}")))?;

        match (field, value) {
            (MakeupField::Enabled, FieldValue::Bool(v)) => self.enabled = v,
            (MakeupField::Type, FieldValue::Text(v)) => self.r#type = v,
            (MakeupField::Intensity, FieldValue::Text(v)) => self.intensity = v,
            (MakeupField::Color, FieldValue::Text(v)) => self.color = v,
            (field, value) => {
                return Err(Error::InvalidField(format!(
                    "{field} does not accept {value:?}"
                )))
            }
        }
        Ok(field)
    }

    pub fn entry(&self) -> MakeupEntry {
        MakeupEntry {
            r#type: self.r#type.clone(),
            intensity: self.intensity.clone(),
            color: self.color.clone(),
            enabled: self.enabled,
        }
    }
}

/// 序列化到隐藏字段中的条目, 不包含 id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakeupEntry {
    #[serde(rename = "type")]
    pub r#type: String,
    #[serde(default = "default_intensity")]
    pub intensity: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_intensity() -> String {
    Intensity::default().to_string()
}

fn default_color() -> String {
    OPTION_NONE.to_string()
}

fn default_enabled() -> bool {
    true
}
