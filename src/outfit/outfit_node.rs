//! 服装提示词节点
//!
//! 女性与男性节点共用同一套输入定义与生成逻辑, 仅数据目录不同。

use log::error;
use pyo3::{
    exceptions::PyRuntimeError,
    pyclass, pymethods,
    types::{PyDict, PyDictMethods, PyType},
    Bound, Py, PyErr, PyResult, Python,
};
use serde_json::Map;
use strum::IntoEnumIterator;

use super::{catalog::OutfitCatalog, generator::OutfitGenerator};
use crate::{
    config::OutfitConfig,
    core::{category::CATEGORY_OUTFIT, init_tracing},
    error::Error,
    utils::{options::OPTION_NONE, seed::SeedMode},
    wrapper::comfyui::{
        types::{NODE_BOOLEAN, NODE_INT, NODE_SEED_MAX, NODE_STRING},
        InputKwargs, PromptServer,
    },
};

type OutfitResult = (String, u64, String, String);

/// 女性服装提示词
#[pyclass(subclass)]
pub struct FemaleOutfitNode {}

impl PromptServer for FemaleOutfitNode {}

#[pymethods]
impl FemaleOutfitNode {
    #[new]
    fn new() -> Self {
        init_tracing();
        Self {}
    }

    #[classattr]
    #[pyo3(name = "RETURN_TYPES")]
    fn return_types() -> (&'static str, &'static str, &'static str, &'static str) {
        (NODE_STRING, NODE_INT, NODE_STRING, NODE_STRING)
    }

    #[classattr]
    #[pyo3(name = "RETURN_NAMES")]
    fn return_names() -> (&'static str, &'static str, &'static str, &'static str) {
        ("positive_prompt", "seed", "negative_prompt", "metadata")
    }

    #[classattr]
    #[pyo3(name = "CATEGORY")]
    const CATEGORY: &'static str = CATEGORY_OUTFIT;

    #[classattr]
    #[pyo3(name = "DESCRIPTION")]
    fn description() -> &'static str {
        "Build a female outfit prompt from presets, dropdown selections and makeup items."
    }

    #[classattr]
    #[pyo3(name = "FUNCTION")]
    const FUNCTION: &'static str = "execute";

    #[classmethod]
    #[pyo3(name = "INPUT_TYPES")]
    fn input_types(_cls: &Bound<'_, PyType>) -> PyResult<Py<PyDict>> {
        Python::with_gil(|py| outfit_input_types(py, "female"))
    }

    #[pyo3(name = "execute", signature = (**kwargs))]
    fn execute(&mut self, py: Python, kwargs: Option<Bound<'_, PyDict>>) -> PyResult<OutfitResult> {
        let result = generate("female", kwargs);

        match result {
            Ok(v) => Ok(v),
            Err(e) => {
                error!("FemaleOutfitNode error, {e}");
                if let Err(e) = self.send_error(py, "FemaleOutfitNode".to_string(), e.to_string()) {
                    error!("send error failed, {e}");
                    return Err(PyErr::new::<PyRuntimeError, _>(e.to_string()));
                };
                Err(PyErr::new::<PyRuntimeError, _>(e.to_string()))
            }
        }
    }
}

/// 男性服装提示词
#[pyclass(subclass)]
pub struct MaleOutfitNode {}

impl PromptServer for MaleOutfitNode {}

#[pymethods]
impl MaleOutfitNode {
    #[new]
    fn new() -> Self {
        init_tracing();
        Self {}
    }

    #[classattr]
    #[pyo3(name = "RETURN_TYPES")]
    fn return_types() -> (&'static str, &'static str, &'static str, &'static str) {
        (NODE_STRING, NODE_INT, NODE_STRING, NODE_STRING)
    }

    #[classattr]
    #[pyo3(name = "RETURN_NAMES")]
    fn return_names() -> (&'static str, &'static str, &'static str, &'static str) {
        ("positive_prompt", "seed", "negative_prompt", "metadata")
    }

    #[classattr]
    #[pyo3(name = "CATEGORY")]
    const CATEGORY: &'static str = CATEGORY_OUTFIT;

    #[classattr]
    #[pyo3(name = "DESCRIPTION")]
    fn description() -> &'static str {
        "Build a male outfit prompt from presets, dropdown selections and makeup items."
    }

    #[classattr]
    #[pyo3(name = "FUNCTION")]
    const FUNCTION: &'static str = "execute";

    #[classmethod]
    #[pyo3(name = "INPUT_TYPES")]
    fn input_types(_cls: &Bound<'_, PyType>) -> PyResult<Py<PyDict>> {
        Python::with_gil(|py| outfit_input_types(py, "male"))
    }

    #[pyo3(name = "execute", signature = (**kwargs))]
    fn execute(&mut self, py: Python, kwargs: Option<Bound<'_, PyDict>>) -> PyResult<OutfitResult> {
        let result = generate("male", kwargs);

        match result {
            Ok(v) => Ok(v),
            Err(e) => {
                error!("MaleOutfitNode error, {e}");
                if let Err(e) = self.send_error(py, "MaleOutfitNode".to_string(), e.to_string()) {
                    error!("send error failed, {e}");
                    return Err(PyErr::new::<PyRuntimeError, _>(e.to_string()));
                };
                Err(PyErr::new::<PyRuntimeError, _>(e.to_string()))
            }
        }
    }
}

/// 将 kwargs 转换为输入并生成提示词
fn generate(gender: &str, kwargs: Option<Bound<'_, PyDict>>) -> Result<OutfitResult, Error> {
    let inputs = match kwargs {
        Some(kwargs) => InputKwargs::new(&kwargs).to_map()?,
        None => Map::new(),
    };

    let catalog = OutfitCatalog::cached(&OutfitConfig::global().data_dir, gender)?;
    let output = OutfitGenerator::new(&catalog).generate(inputs)?;
    Ok(output.into_tuple())
}

/// 下拉框定义
fn combo<'py>(
    py: Python<'py>,
    options: &[String],
    default: &str,
    tooltip: &str,
) -> PyResult<(Vec<String>, Bound<'py, PyDict>)> {
    let config = PyDict::new(py);
    let default = if options.iter().any(|v| v == default) {
        default
    } else {
        options.first().map(String::as_str).unwrap_or(OPTION_NONE)
    };
    config.set_item("default", default)?;
    config.set_item("tooltip", tooltip)?;
    Ok((options.to_vec(), config))
}

/// 文本框定义
fn text_box<'py>(
    py: Python<'py>,
    multiline: bool,
    tooltip: &str,
) -> PyResult<(&'static str, Bound<'py, PyDict>)> {
    let config = PyDict::new(py);
    config.set_item("default", "")?;
    config.set_item("multiline", multiline)?;
    config.set_item("tooltip", tooltip)?;
    Ok((NODE_STRING, config))
}

/// 开关定义
fn toggle<'py>(
    py: Python<'py>,
    default: bool,
    tooltip: &str,
) -> PyResult<(&'static str, Bound<'py, PyDict>)> {
    let config = PyDict::new(py);
    config.set_item("default", default)?;
    config.set_item("tooltip", tooltip)?;
    Ok((NODE_BOOLEAN, config))
}

/// 种子定义
fn seed_input<'py>(py: Python<'py>, tooltip: &str) -> PyResult<(&'static str, Bound<'py, PyDict>)> {
    let config = PyDict::new(py);
    config.set_item("default", 0)?;
    config.set_item("min", 0)?;
    config.set_item("max", NODE_SEED_MAX)?;
    config.set_item("tooltip", tooltip)?;
    Ok((NODE_INT, config))
}

fn outfit_input_types(py: Python<'_>, gender: &str) -> PyResult<Py<PyDict>> {
    let catalog = OutfitCatalog::cached(&OutfitConfig::global().data_dir, gender)
        .map_err(|e| PyErr::new::<PyRuntimeError, _>(e.to_string()))?;

    let dict = PyDict::new(py);
    dict.set_item("required", {
        let required = PyDict::new(py);
        required.set_item(
            "preset",
            combo(py, &catalog.preset_names(), OPTION_NONE, "Outfit preset to start from")?,
        )?;
        required.set_item(
            "preset_colors",
            toggle(py, true, "Keep the colors written in the preset")?,
        )?;
        required.set_item(
            "lock_preset_fields",
            toggle(py, false, "Preset overrides pose, background and scene fields")?,
        )?;
        required.set_item(
            "avoid_terms",
            text_box(py, true, "Extra negative terms, comma separated")?,
        )?;
        required.set_item(
            "age_group",
            combo(py, &catalog.age_groups, OPTION_NONE, "Age group")?,
        )?;
        required.set_item("character_name", text_box(py, false, "Character name")?)?;
        required.set_item(
            "body_type",
            combo(py, &catalog.body_types, OPTION_NONE, "Body type")?,
        )?;
        required.set_item("pose", combo(py, &catalog.poses, OPTION_NONE, "Pose")?)?;
        required.set_item(
            "background",
            combo(py, &catalog.backgrounds, OPTION_NONE, "Background")?,
        )?;
        required.set_item("race", combo(py, &catalog.races, OPTION_NONE, "Race")?)?;
        required.set_item("mood", combo(py, &catalog.scene.moods, OPTION_NONE, "Mood")?)?;
        required.set_item(
            "time_of_day",
            combo(py, &catalog.scene.times, OPTION_NONE, "Time of day")?,
        )?;
        required.set_item(
            "weather",
            combo(py, &catalog.scene.weather, OPTION_NONE, "Weather")?,
        )?;
        required.set_item(
            "color_scheme",
            combo(py, &catalog.scene.color_schemes, OPTION_NONE, "Color scheme")?,
        )?;
        required.set_item(
            "description_style",
            combo(py, &catalog.description_styles, OPTION_NONE, "Description style")?,
        )?;
        required.set_item(
            "creative_scale",
            combo(py, &catalog.scales, OPTION_NONE, "Level of detail")?,
        )?;
        required.set_item(
            "custom_attributes",
            text_box(py, true, "Appended to the prompt as is")?,
        )?;
        required.set_item("seed", seed_input(py, "Image seed")?)?;
        required.set_item(
            "style_seed",
            seed_input(py, "Seed for random selections, 0 uses the image seed")?,
        )?;
        let seed_modes = SeedMode::iter().map(|m| m.to_string()).collect::<Vec<_>>();
        required.set_item(
            "seed_mode",
            combo(py, &seed_modes, &SeedMode::default().to_string(), "How the seed changes between runs")?,
        )?;
        required.set_item(
            "enable_cache",
            toggle(py, true, "Reuse the output for identical inputs, not used in random seed mode")?,
        )?;

        for part in &catalog.body_parts {
            let options = catalog.outfit.get(part).map(Vec::as_slice).unwrap_or_default();
            required.set_item(part, combo(py, options, OPTION_NONE, part)?)?;
        }
        required
    })?;

    dict.set_item("hidden", {
        let hidden = PyDict::new(py);
        hidden.set_item("makeup_data", text_box(py, false, "Serialized makeup items")?)?;
        hidden.set_item("_last_seed", seed_input(py, "Seed used by the previous run")?)?;
        hidden.set_item("inputs_json", text_box(py, true, "JSON object overriding inputs")?)?;
        hidden
    })?;

    Ok(dict.into())
}
