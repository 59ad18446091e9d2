//! 运行时配置
//!
//! 通过环境变量覆盖:
//! - `COMFYUI_OUTFIT_DATA_DIR`: 数据目录, 默认为插件目录下的 `data`
//! - `OLLAMA_URL`: Ollama generate 接口地址
//! - `OLLAMA_TIMEOUT_SECS`: generate 请求超时时间(秒)

use std::{path::PathBuf, time::Duration};

use lazy_static::lazy_static;

pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434/api/generate";
pub const DEFAULT_OLLAMA_TIMEOUT_SECS: u64 = 60;
/// 获取模型列表的超时时间
pub const OLLAMA_TAGS_TIMEOUT_SECS: u64 = 5;

lazy_static! {
    static ref CONFIG: OutfitConfig = OutfitConfig::from_env();
}

#[derive(Debug, Clone)]
pub struct OutfitConfig {
    pub data_dir: PathBuf,
    pub ollama_url: String,
    pub ollama_timeout: Duration,
}

impl Default for OutfitConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data"),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            ollama_timeout: Duration::from_secs(DEFAULT_OLLAMA_TIMEOUT_SECS),
        }
    }
}

impl OutfitConfig {
    /// 全局配置
    pub fn global() -> &'static OutfitConfig {
        &CONFIG
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup("COMFYUI_OUTFIT_DATA_DIR").filter(|v| !v.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("OLLAMA_URL").filter(|v| !v.trim().is_empty()) {
            config.ollama_url = url.trim().to_string();
        }
        if let Some(secs) = lookup("OLLAMA_TIMEOUT_SECS") {
            match secs.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.ollama_timeout = Duration::from_secs(secs),
                Ok(_) => log::warn!("OLLAMA_TIMEOUT_SECS must be positive, keep default"),
                Err(e) => log::warn!("invalid OLLAMA_TIMEOUT_SECS {secs:?}, {e}"),
            }
        }

        config
    }

    /// 服装数据目录
    pub fn outfit_dir(&self) -> PathBuf {
        self.data_dir.join("outfit")
    }

    /// 风格数据目录
    pub fn styles_dir(&self) -> PathBuf {
        self.data_dir.join("styles")
    }
}
