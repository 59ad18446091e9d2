//! 节点输入参数 kwargs 解析

use pyo3::{
    types::{PyAnyMethods, PyDict, PyDictMethods},
    Bound,
};
use serde_json::{Map, Value};

use crate::error::Error;

/// ComfyUI 以 **kwargs 传入的节点参数
pub struct InputKwargs<'py> {
    kwargs: Bound<'py, PyDict>,
}

impl<'py> InputKwargs<'py> {
    pub fn new(kwargs: &Bound<'py, PyDict>) -> Self {
        Self {
            kwargs: kwargs.clone(),
        }
    }

    /// 全部参数转换为 json 对象
    ///
    /// 无法转换的值 (如张量) 会被跳过
    pub fn to_map(&self) -> Result<Map<String, Value>, Error> {
        let mut map = Map::new();
        for (key, value) in self.kwargs.iter() {
            let key: String = key.extract()?;
            match pythonize::depythonize::<Value>(&value) {
                Ok(v) => {
                    map.insert(key, v);
                }
                Err(e) => log::debug!("skip kwargs {key}, {e}"),
            }
        }
        Ok(map)
    }
}
