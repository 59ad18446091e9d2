//! Ollama HTTP 接口
//!
//! - `GET <base>/api/tags`: 模型列表
//! - `POST <base>/api/generate`: 非流式生成

use std::time::Duration;

use log::{debug, warn};
use regex::Regex;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::{config::OLLAMA_TAGS_TIMEOUT_SECS, error::Error};

#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub system: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerateOptions>,
}

impl<'a> GenerateRequest<'a> {
    /// 非流式请求, seed 为 0 时不指定种子
    pub fn new(model: &'a str, system: &'a str, prompt: &'a str, seed: u64) -> Self {
        Self {
            model,
            system,
            prompt,
            stream: false,
            options: (seed > 0).then_some(GenerateOptions { seed }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GenerateOptions {
    pub seed: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Clone, Deserialize)]
struct ModelTag {
    name: String,
}

pub struct OllamaClient {
    generate_url: String,
    timeout: Duration,
}

impl OllamaClient {
    /// `generate_url` 为 generate 接口地址
    pub fn new(generate_url: &str, timeout: Duration) -> Self {
        Self {
            generate_url: generate_url.trim().to_string(),
            timeout,
        }
    }

    /// 由 generate 地址推导 tags 地址
    pub fn tags_url(&self) -> String {
        if self.generate_url.contains("/api/generate") {
            self.generate_url.replace("/api/generate", "/api/tags")
        } else {
            format!("{}/api/tags", self.generate_url.trim_end_matches('/'))
        }
    }

    /// 已安装的模型
    pub fn list_models(&self) -> Result<Vec<String>, Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(OLLAMA_TAGS_TIMEOUT_SECS))
            .build()?;
        let tags: TagsResponse = client.get(self.tags_url()).send()?.error_for_status()?.json()?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// 获取模型列表, 服务不可用时返回空列表
    pub fn list_models_or_empty(&self) -> Vec<String> {
        self.list_models().unwrap_or_else(|e| {
            warn!("could not fetch ollama models, {e}");
            Vec::new()
        })
    }

    /// 模型是否已安装, 无法获取模型列表时视为可用
    pub fn is_model_available(&self, model: &str) -> bool {
        let models = self.list_models_or_empty();
        models.is_empty() || models.iter().any(|m| m == model)
    }

    /// 生成文本, 返回清理后的结果
    pub fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, Error> {
        debug!("ollama generate, model: {}", request.model);
        let client = Client::builder().timeout(self.timeout).build()?;
        let response: GenerateResponse = client
            .post(&self.generate_url)
            .json(request)
            .send()?
            .error_for_status()?
            .json()?;
        clean_response(&response.response)
    }
}

/// 去除首尾空白与引号, 以及开头的 "Output:" 标签
pub fn clean_response(response: &str) -> Result<String, Error> {
    let re_label = Regex::new(r"(?i)^\s*output\s*:\s*")?;
    let text = response.trim().trim_matches(|c| c == '"' || c == '\'');
    let text = re_label.replace(text, "");
    Ok(text
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_OLLAMA_TIMEOUT_SECS, DEFAULT_OLLAMA_URL};

    #[test]
    fn test_tags_url() {
        let client = OllamaClient::new(DEFAULT_OLLAMA_URL, Duration::from_secs(1));
        assert_eq!(client.tags_url(), "http://127.0.0.1:11434/api/tags");

        let client = OllamaClient::new("http://gpu-box:11434/", Duration::from_secs(1));
        assert_eq!(client.tags_url(), "http://gpu-box:11434/api/tags");
    }

    #[test]
    fn test_clean_response() -> anyhow::Result<()> {
        assert_eq!(
            clean_response("  \"woman, (red lipstick:1.1)\"\n")?,
            "woman, (red lipstick:1.1)"
        );
        assert_eq!(
            clean_response("Output: A woman in a red dress.")?,
            "A woman in a red dress."
        );
        assert_eq!(clean_response("'OUTPUT:  \"quoted\"'")?, "quoted");
        assert_eq!(clean_response("")?, "");
        Ok(())
    }

    #[test]
    fn test_generate_request_json() -> anyhow::Result<()> {
        let request = GenerateRequest::new("llama3", "sys", "woman with boots", 0);
        assert_eq!(
            serde_json::to_string(&request)?,
            r#"{"model":"llama3","system":"sys","prompt":"woman with boots","stream":false}"#
        );

        let request = GenerateRequest::new("llama3", "sys", "woman with boots", 42);
        assert_eq!(
            serde_json::to_string(&request)?,
            r#"{"model":"llama3","system":"sys","prompt":"woman with boots","stream":false,"options":{"seed":42}}"#
        );
        Ok(())
    }

    #[test]
    fn test_unreachable_server() {
        let client = OllamaClient::new("http://127.0.0.1:9/api/generate", Duration::from_secs(1));
        assert!(client.list_models_or_empty().is_empty());
    }

    #[test]
    #[ignore = "requires a running ollama server"]
    fn test_live_generate() -> anyhow::Result<()> {
        let client = OllamaClient::new(
            DEFAULT_OLLAMA_URL,
            Duration::from_secs(DEFAULT_OLLAMA_TIMEOUT_SECS),
        );
        let models = client.list_models()?;
        let Some(model) = models.first() else {
            return Ok(());
        };
        let text = client.generate(&GenerateRequest::new(model, "Repeat the input.", "red dress", 7))?;
        assert!(!text.is_empty());
        Ok(())
    }
}
