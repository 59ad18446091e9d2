pub mod config;
pub mod core;
pub mod error;
pub mod wrapper;

pub mod llm;
pub mod makeup;
pub mod outfit;
pub mod prompt;
pub mod utils;

use pyo3::{
    pymodule,
    types::{PyDict, PyDictMethods, PyModule, PyModuleMethods},
    Bound, PyResult, Python,
};

use crate::{config::OutfitConfig, core::node::NodeRegister, utils::data_loader::validate_data_integrity};

/// 前端资源目录
const WEB_DIRECTORY: &str = "./web";

/// 启动时检查的数据文件
const REQUIRED_DATA_FILES: [&str; 4] = [
    "backgrounds.json",
    "race.json",
    "age_groups.json",
    "presets.json",
];

/// A Python module implemented in Rust.
#[pymodule]
#[pyo3(name = "comfyui_outfit")] // 需要与包名保持一致
fn py_init(py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    // 每个扩展模块有独立的记录器
    crate::core::init_tracing();

    let data_dir = &OutfitConfig::global().data_dir;
    if !validate_data_integrity(data_dir, &REQUIRED_DATA_FILES) {
        log::warn!(
            "outfit data is incomplete, dropdowns fall back to defaults: {}",
            data_dir.display()
        );
    }

    // 添加子模块
    m.add_submodule(&outfit::submodule(py)?)?;
    m.add_submodule(&makeup::submodule(py)?)?;
    m.add_submodule(&llm::submodule(py)?)?;

    // 注册 ComfyUI NODE_CLASS_MAPPINGS/NODE_DISPLAY_NAME_MAPPINGS
    let node_mapping = PyDict::new(py);
    let name_mapping = PyDict::new(py);

    for node in node_register(py)? {
        node_mapping.set_item(node.0, node.1)?;
        name_mapping.set_item(node.0, node.2)?;
    }

    m.add("NODE_CLASS_MAPPINGS", node_mapping)?;
    m.add("NODE_DISPLAY_NAME_MAPPINGS", name_mapping)?;
    m.add("WEB_DIRECTORY", WEB_DIRECTORY)?;
    Ok(())
}

/// 节点注册
fn node_register(py: Python<'_>) -> PyResult<Vec<NodeRegister<'_>>> {
    let mut nodes: Vec<NodeRegister> = Vec::new();
    nodes.extend(outfit::node_register(py)?);
    nodes.extend(llm::node_register(py)?);
    nodes.extend(makeup::node_register(py)?);
    Ok(nodes)
}
