//! 服装提示词

use pyo3::{
    types::{PyModule, PyModuleMethods},
    Bound, PyResult, Python,
};

use crate::core::node::NodeRegister;

pub mod catalog;
pub mod generator;

mod outfit_node;
pub use outfit_node::{FemaleOutfitNode, MaleOutfitNode};

/// 服装模块
pub fn submodule(py: Python<'_>) -> PyResult<Bound<'_, PyModule>> {
    let submodule = PyModule::new(py, "outfit")?;
    submodule.add_class::<FemaleOutfitNode>()?;
    submodule.add_class::<MaleOutfitNode>()?;
    Ok(submodule)
}

/// 服装模块节点注册
pub fn node_register(py: Python<'_>) -> PyResult<Vec<NodeRegister<'_>>> {
    let nodes: Vec<NodeRegister> = vec![
        NodeRegister(
            "FemaleOutfitNode",
            py.get_type::<FemaleOutfitNode>(),
            "♀️ Female Outfit",
        ),
        NodeRegister(
            "MaleOutfitNode",
            py.get_type::<MaleOutfitNode>(),
            "♂️ Male Outfit",
        ),
    ];
    Ok(nodes)
}
