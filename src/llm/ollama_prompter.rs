//! Ollama Prompter
//!
//! 由关键词与场景选项拼出基础提示词, 再按风格、细节程度与创作模式交给 Ollama 扩写。

use std::{collections::BTreeMap, path::Path};

use log::error;
use pyo3::{
    pyclass, pymethods,
    types::{PyDict, PyDictMethods, PyType},
    Bound, Py, PyResult, Python,
};

use super::{
    ollama::{GenerateRequest, OllamaClient},
    simple_ollama_prompter::{MODEL_DISABLED, OLLAMA_SEED_MAX},
};
use crate::{
    config::OutfitConfig,
    core::{category::CATEGORY_SUPPORT, init_tracing},
    error::Error,
    utils::{
        data_loader::{
            load_creative_modes, load_scale_instructions, load_scale_options,
            load_scene_highlights, CreativeModes, SceneHighlights, CREATIVE_MODE_STANDARD,
        },
        options::{OPTION_NONE, OPTION_RANDOM},
    },
    wrapper::comfyui::{
        types::{NODE_INT, NODE_STRING},
        PromptServer,
    },
};

/// 附加在系统提示词中的风格
pub const PROMPT_STYLES: [&str; 6] = [
    OPTION_NONE,
    "cinematic",
    "artistic",
    "photographic",
    "surreal",
    "minimalist",
];

const BASE_INSTRUCTIONS: [&str; 3] = [
    "Focus exclusively on constructing a detailed, artistic prompt for image generation.",
    "Do not include meta-commentary or statements about AI capabilities.",
    "Use precise, vivid and professional language suitable for image generation workflows.",
];

/// 下拉框与模型指令数据
#[derive(Debug, Clone)]
pub struct PrompterStyles {
    pub scene: SceneHighlights,
    pub detail_scales: Vec<String>,
    pub scale_instructions: BTreeMap<String, String>,
    pub creative: CreativeModes,
}

impl PrompterStyles {
    pub fn load(styles_dir: &Path) -> Self {
        Self {
            scene: load_scene_highlights(styles_dir),
            detail_scales: without_random(load_scale_options(styles_dir)),
            scale_instructions: load_scale_instructions(styles_dir),
            creative: load_creative_modes(styles_dir),
        }
    }

    /// 组装系统提示词, 没有对应指令的选项会被跳过
    pub fn system_prompt(&self, inputs: &PrompterInputs) -> String {
        let mut lines = BASE_INSTRUCTIONS
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>();
        if let Some(v) = self.scale_instructions.get(&inputs.detail_scale) {
            lines.push(v.clone());
        }
        if let Some(v) = self.creative.instructions.get(&inputs.creative_mode) {
            lines.push(v.clone());
        }
        if !is_unset(&inputs.prompt_style) {
            lines.push(format!("Prompt style: {}", inputs.prompt_style));
        }
        lines.retain(|l| !l.trim().is_empty());
        lines.join("\n")
    }
}

/// 节点输入
#[derive(Debug, Clone, Default)]
pub struct PrompterInputs {
    pub keywords: String,
    pub custom_prompt: String,
    pub prompt_style: String,
    pub scene_mood: String,
    pub scene_time: String,
    pub scene_weather: String,
    pub color_scheme: String,
    pub detail_scale: String,
    pub creative_mode: String,
}

impl PrompterInputs {
    /// 关键词, 自定义文本与场景选项, 以逗号连接
    pub fn base_prompt(&self) -> String {
        let scene = [
            (&self.scene_mood, "mood"),
            (&self.scene_time, ""),
            (&self.scene_weather, ""),
            (&self.color_scheme, "color scheme"),
        ];

        let mut parts = vec![
            self.keywords.trim().to_string(),
            self.custom_prompt.trim().to_string(),
        ];
        parts.extend(
            scene
                .into_iter()
                .filter(|(value, _)| !is_unset(value))
                .map(|(value, suffix)| format!("{} {suffix}", value.trim()).trim().to_string()),
        );
        parts.retain(|p| !p.is_empty());
        parts.join(", ")
    }
}

/// 空字符串, "none" 与 "random" 视为未设置
fn is_unset(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == OPTION_NONE || value == OPTION_RANDOM
}

fn without_random(options: Vec<String>) -> Vec<String> {
    options.into_iter().filter(|o| o != OPTION_RANDOM).collect()
}

/// Ollama Prompter
#[pyclass(subclass)]
pub struct OllamaPrompter {}

impl PromptServer for OllamaPrompter {}

#[pymethods]
impl OllamaPrompter {
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
        ("enhanced_prompt",)
    }

    #[classattr]
    #[pyo3(name = "CATEGORY")]
    const CATEGORY: &'static str = CATEGORY_SUPPORT;

    #[classattr]
    #[pyo3(name = "DESCRIPTION")]
    fn description() -> &'static str {
        "Expand keywords and scene options into a detailed image prompt with a local Ollama model."
    }

    #[classattr]
    #[pyo3(name = "FUNCTION")]
    const FUNCTION: &'static str = "execute";

    #[classmethod]
    #[pyo3(name = "INPUT_TYPES")]
    fn input_types(_cls: &Bound<'_, PyType>) -> PyResult<Py<PyDict>> {
        Python::with_gil(|py| {
            let config = OutfitConfig::global();
            let styles = PrompterStyles::load(&config.styles_dir());
            let client = OllamaClient::new(&config.ollama_url, config.ollama_timeout);
            let mut models = vec![MODEL_DISABLED.to_string()];
            models.extend(client.list_models_or_empty());

            let combo = |options: Vec<String>, default: &str| -> PyResult<_> {
                let extra = PyDict::new(py);
                extra.set_item("default", default)?;
                Ok((options, extra))
            };

            let dict = PyDict::new(py);
            dict.set_item("required", {
                let required = PyDict::new(py);
                required.set_item(
                    "keywords",
                    (NODE_STRING, {
                        let keywords = PyDict::new(py);
                        keywords.set_item("default", "")?;
                        keywords.set_item("multiline", true)?;
                        keywords
                    }),
                )?;
                required.set_item("model_name", combo(models, MODEL_DISABLED)?)?;
                required.set_item(
                    "prompt_style",
                    combo(PROMPT_STYLES.map(String::from).to_vec(), OPTION_NONE)?,
                )?;
                required.set_item(
                    "scene_mood",
                    combo(without_random(styles.scene.moods), OPTION_NONE)?,
                )?;
                required.set_item(
                    "scene_time",
                    combo(without_random(styles.scene.times), OPTION_NONE)?,
                )?;
                required.set_item(
                    "scene_weather",
                    combo(without_random(styles.scene.weather), OPTION_NONE)?,
                )?;
                required.set_item(
                    "color_scheme",
                    combo(without_random(styles.scene.color_schemes), OPTION_NONE)?,
                )?;
                required.set_item("detail_scale", combo(styles.detail_scales, OPTION_NONE)?)?;
                required.set_item(
                    "creative_mode",
                    combo(styles.creative.modes, CREATIVE_MODE_STANDARD)?,
                )?;
                required
            })?;

            dict.set_item("optional", {
                let optional = PyDict::new(py);
                optional.set_item(
                    "custom_prompt",
                    (NODE_STRING, {
                        let custom_prompt = PyDict::new(py);
                        custom_prompt.set_item("default", "")?;
                        custom_prompt.set_item("multiline", true)?;
                        custom_prompt
                    }),
                )?;
                optional.set_item(
                    "seed",
                    (NODE_INT, {
                        let seed = PyDict::new(py);
                        seed.set_item("default", 0)?;
                        seed.set_item("min", 0)?;
                        seed.set_item("max", OLLAMA_SEED_MAX)?;
                        seed
                    }),
                )?;
                optional.set_item(
                    "ollama_url",
                    (NODE_STRING, {
                        let ollama_url = PyDict::new(py);
                        ollama_url.set_item("default", config.ollama_url.clone())?;
                        ollama_url
                    }),
                )?;
                optional
            })?;
            Ok(dict.into())
        })
    }

    #[pyo3(
        name = "execute",
        signature = (
            keywords,
            model_name,
            prompt_style,
            scene_mood,
            scene_time,
            scene_weather,
            color_scheme,
            detail_scale,
            creative_mode,
            custom_prompt=String::new(),
            seed=0,
            ollama_url=None
        )
    )]
    #[allow(clippy::too_many_arguments)]
    fn execute(
        &mut self,
        py: Python,
        keywords: String,
        model_name: String,
        prompt_style: String,
        scene_mood: String,
        scene_time: String,
        scene_weather: String,
        color_scheme: String,
        detail_scale: String,
        creative_mode: String,
        custom_prompt: String,
        seed: u64,
        ollama_url: Option<String>,
    ) -> PyResult<(String,)> {
        let inputs = PrompterInputs {
            keywords,
            custom_prompt,
            prompt_style,
            scene_mood,
            scene_time,
            scene_weather,
            color_scheme,
            detail_scale,
            creative_mode,
        };
        let result = self.enhance_prompt(&inputs, &model_name, seed, ollama_url);

        match result {
            Ok(v) => Ok((v,)),
            Err(e) => {
                error!("OllamaPrompter error, {e}");
                if let Err(e) = self.send_error(py, "OllamaPrompter".to_string(), e.to_string()) {
                    error!("send error failed, {e}");
                };
                // 不中断工作流, 错误信息作为输出
                Ok((format!("ERROR: {e}"),))
            }
        }
    }
}

impl OllamaPrompter {
    /// 模型关闭或没有输入时直接返回基础提示词
    fn enhance_prompt(
        &self,
        inputs: &PrompterInputs,
        model_name: &str,
        seed: u64,
        ollama_url: Option<String>,
    ) -> Result<String, Error> {
        let base_prompt = inputs.base_prompt();
        if model_name == MODEL_DISABLED || base_prompt.is_empty() {
            return Ok(base_prompt);
        }

        let config = OutfitConfig::global();
        let styles = PrompterStyles::load(&config.styles_dir());
        let system = styles.system_prompt(inputs);

        let url = ollama_url
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| config.ollama_url.clone());
        let client = OllamaClient::new(&url, config.ollama_timeout);
        let text = client.generate(&GenerateRequest::new(model_name, &system, &base_prompt, seed))?;
        if text.is_empty() {
            return Ok(format!("ERROR: Empty response from model {model_name}"));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn styles() -> PrompterStyles {
        PrompterStyles::load(&PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data").join("styles"))
    }

    fn inputs() -> PrompterInputs {
        PrompterInputs {
            keywords: " woman in a red coat ".to_string(),
            custom_prompt: "holding an umbrella".to_string(),
            prompt_style: "cinematic".to_string(),
            scene_mood: "mysterious".to_string(),
            scene_time: "night".to_string(),
            scene_weather: "none".to_string(),
            color_scheme: "cool tones".to_string(),
            detail_scale: "detailed".to_string(),
            creative_mode: "standard".to_string(),
        }
    }

    #[test]
    fn test_base_prompt() {
        assert_eq!(
            inputs().base_prompt(),
            "woman in a red coat, holding an umbrella, mysterious mood, night, cool tones color scheme"
        );
        assert_eq!(PrompterInputs::default().base_prompt(), "");
    }

    #[test]
    fn test_system_prompt() {
        let styles = styles();
        let system = styles.system_prompt(&inputs());
        let lines = system.lines().collect::<Vec<_>>();
        assert_eq!(lines[..3], BASE_INSTRUCTIONS);
        assert_eq!(lines[3], styles.scale_instructions["detailed"]);
        assert_eq!(lines[4], styles.creative.instructions["standard"]);
        assert_eq!(lines[5], "Prompt style: cinematic");

        let plain = PrompterInputs {
            prompt_style: "none".to_string(),
            detail_scale: "none".to_string(),
            creative_mode: "unknown".to_string(),
            ..inputs()
        };
        assert_eq!(styles.system_prompt(&plain), BASE_INSTRUCTIONS.join("\n"));
    }

    #[test]
    fn test_dropdowns_have_no_random() {
        let styles = styles();
        assert_eq!(styles.detail_scales[0], "none");
        assert!(!styles.detail_scales.contains(&"random".to_string()));
        assert!(styles.detail_scales.contains(&"hyper detailed".to_string()));
    }

    #[test]
    fn test_disabled_returns_base_prompt() -> anyhow::Result<()> {
        let node = OllamaPrompter {};
        let text = node.enhance_prompt(&inputs(), MODEL_DISABLED, 0, None)?;
        assert_eq!(text, inputs().base_prompt());

        let text = node.enhance_prompt(&PrompterInputs::default(), "llama3", 0, None)?;
        assert_eq!(text, "");
        Ok(())
    }

    #[test]
    fn test_unreachable_server_is_error() {
        let node = OllamaPrompter {};
        let result = node.enhance_prompt(
            &inputs(),
            "llama3",
            7,
            Some("http://127.0.0.1:9/api/generate".to_string()),
        );
        assert!(matches!(result, Err(Error::ReqwestError(_))));
    }
}
