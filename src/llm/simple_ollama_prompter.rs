//! Simple Ollama Prompter
//!
//! 将自由文本交给本地 Ollama 模型整理为 SDXL 或 Flux 风格的提示词。

use log::{error, warn};
use pyo3::{
    pyclass, pymethods,
    types::{PyDict, PyDictMethods, PyType},
    Bound, Py, PyResult, Python,
};
use strum::IntoEnumIterator;

use super::{
    ollama::{GenerateRequest, OllamaClient},
    prompt_style::PromptStyle,
};
use crate::{
    config::OutfitConfig,
    core::{category::CATEGORY_SUPPORT, init_tracing},
    error::Error,
    wrapper::comfyui::{
        types::{NODE_INT, NODE_STRING},
        PromptServer,
    },
};

/// 关闭模型时不请求 Ollama
pub const MODEL_DISABLED: &str = "disabled";
/// 种子输入上限
pub const OLLAMA_SEED_MAX: u64 = 999_999;

/// Simple Ollama Prompter
#[pyclass(subclass)]
pub struct SimpleOllamaPrompter {}

impl PromptServer for SimpleOllamaPrompter {}

#[pymethods]
impl SimpleOllamaPrompter {
    #[new]
    fn new() -> Self {
        init_tracing();
        Self {}
    }

    #[classattr]
    #[pyo3(name = "RETURN_TYPES")]
    fn return_types() -> (&'static str,) {
        (NODE_STRING,)
    }

    #[classattr]
    #[pyo3(name = "RETURN_NAMES")]
    fn return_names() -> (&'static str,) {
        ("formatted_prompt",)
    }

    #[classattr]
    #[pyo3(name = "CATEGORY")]
    const CATEGORY: &'static str = CATEGORY_SUPPORT;

    #[classattr]
    #[pyo3(name = "DESCRIPTION")]
    fn description() -> &'static str {
        "Format free text as an SDXL or Flux prompt with a local Ollama model."
    }

    #[classattr]
    #[pyo3(name = "FUNCTION")]
    const FUNCTION: &'static str = "execute";

    #[classmethod]
    #[pyo3(name = "INPUT_TYPES")]
    fn input_types(_cls: &Bound<'_, PyType>) -> PyResult<Py<PyDict>> {
        Python::with_gil(|py| {
            let config = OutfitConfig::global();
            let client = OllamaClient::new(&config.ollama_url, config.ollama_timeout);
            let mut models = vec![MODEL_DISABLED.to_string()];
            models.extend(client.list_models_or_empty());

            let dict = PyDict::new(py);
            dict.set_item("required", {
                let required = PyDict::new(py);
                required.set_item(
                    "custom_data",
                    (NODE_STRING, {
                        let custom_data = PyDict::new(py);
                        custom_data.set_item("default", "")?;
                        custom_data.set_item("multiline", true)?;
                        custom_data
                    }),
                )?;
                required.set_item(
                    "model_name",
                    (models, {
                        let model_name = PyDict::new(py);
                        model_name.set_item("default", MODEL_DISABLED)?;
                        model_name.set_item("tooltip", "Ollama model, disabled passes the text through")?;
                        model_name
                    }),
                )?;
                required.set_item(
                    "prompt_style",
                    (
                        PromptStyle::iter().map(|s| s.to_string()).collect::<Vec<_>>(),
                        {
                            let prompt_style = PyDict::new(py);
                            prompt_style.set_item("default", PromptStyle::default().to_string())?;
                            prompt_style
                        },
                    ),
                )?;
                required
            })?;

            dict.set_item("optional", {
                let optional = PyDict::new(py);
                optional.set_item(
                    "ollama_url",
                    (NODE_STRING, {
                        let ollama_url = PyDict::new(py);
                        ollama_url.set_item("default", config.ollama_url.clone())?;
                        ollama_url
                    }),
                )?;
                optional.set_item(
                    "seed",
                    (NODE_INT, {
                        let seed = PyDict::new(py);
                        seed.set_item("default", 0)?;
                        seed.set_item("min", 0)?;
                        seed.set_item("max", OLLAMA_SEED_MAX)?;
                        seed.set_item("tooltip", "0 lets the model choose")?;
                        seed
                    }),
                )?;
                optional
            })?;
            Ok(dict.into())
        })
    }

    #[pyo3(name = "execute", signature = (custom_data, model_name, prompt_style, ollama_url=None, seed=0))]
    fn execute(
        &mut self,
        py: Python,
        custom_data: String,
        model_name: String,
        prompt_style: String,
        ollama_url: Option<String>,
        seed: u64,
    ) -> PyResult<(String,)> {
        let result = self.format_prompt(&custom_data, &model_name, &prompt_style, ollama_url, seed);

        match result {
            Ok(v) => Ok((v,)),
            Err(e) => {
                error!("SimpleOllamaPrompter error, {e}");
                if let Err(e) =
                    self.send_error(py, "SimpleOllamaPrompter".to_string(), e.to_string())
                {
                    error!("send error failed, {e}");
                };
                // 不中断工作流, 错误信息作为输出
                Ok((format!("ERROR: {e}"),))
            }
        }
    }
}

impl SimpleOllamaPrompter {
    /// 格式化提示词
    ///
    /// 模型关闭、模型未安装、请求失败或返回为空时, 不经过模型直接格式化
    fn format_prompt(
        &self,
        custom_data: &str,
        model_name: &str,
        prompt_style: &str,
        ollama_url: Option<String>,
        seed: u64,
    ) -> Result<String, Error> {
        let custom_data = custom_data.trim();
        if custom_data.is_empty() {
            return Ok(String::new());
        }

        let style: PromptStyle = prompt_style
            .parse()
            .map_err(|e| Error::ParseEnumString(format!("prompt style {prompt_style:?}, {e}")))?;
        if model_name == MODEL_DISABLED {
            return Ok(style.format_without_llm(custom_data));
        }

        let config = OutfitConfig::global();
        let url = ollama_url
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| config.ollama_url.clone());
        let client = OllamaClient::new(&url, config.ollama_timeout);

        if !client.is_model_available(model_name) {
            warn!("ollama model {model_name} is not installed, format without llm");
            return Ok(style.format_without_llm(custom_data));
        }

        let request = GenerateRequest::new(model_name, style.system_prompt(), custom_data, seed);
        match client.generate(&request) {
            Ok(text) if !text.is_empty() => Ok(text),
            Ok(_) => {
                warn!("empty response from {model_name}, format without llm");
                Ok(style.format_without_llm(custom_data))
            }
            Err(e) => {
                warn!("ollama request failed, format without llm, {e}");
                Ok(style.format_without_llm(custom_data))
            }
        }
    }
}
