//! 本地大模型

use pyo3::{
    types::{PyModule, PyModuleMethods},
    Bound, PyResult, Python,
};

use crate::core::node::NodeRegister;

pub mod ollama;
pub mod prompt_style;

mod ollama_prompter;
pub use ollama_prompter::OllamaPrompter;

mod simple_ollama_prompter;
pub use simple_ollama_prompter::SimpleOllamaPrompter;

/// 大模型模块
pub fn submodule(py: Python<'_>) -> PyResult<Bound<'_, PyModule>> {
    let submodule = PyModule::new(py, "llm")?;
    submodule.add_class::<OllamaPrompter>()?;
    submodule.add_class::<SimpleOllamaPrompter>()?;
    Ok(submodule)
}

/// 大模型模块节点注册
pub fn node_register(py: Python<'_>) -> PyResult<Vec<NodeRegister<'_>>> {
    let nodes: Vec<NodeRegister> = vec![
        NodeRegister(
            "OllamaLLMNode",
            py.get_type::<OllamaPrompter>(),
            "✨ Ollama Prompter",
        ),
        NodeRegister(
            "SimpleOllamaPrompter",
            py.get_type::<SimpleOllamaPrompter>(),
            "Simple Ollama Prompter",
        ),
    ];
    Ok(nodes)
}
