//! 化妆编辑器节点
//!
//! 前端控件通过节点实例上的方法增删改条目, 序列化结果写入隐藏字段 `makeup_data`,
//! 执行时输出化妆提示词。

use std::sync::{Mutex, MutexGuard};

use log::{error, warn};
use pyo3::{
    exceptions::PyRuntimeError,
    pyclass, pymethods,
    types::{
        PyAnyMethods, PyBool, PyBoolMethods, PyDict, PyDictMethods, PyList, PyListMethods, PyType,
    },
    Bound, Py, PyAny, PyErr, PyResult, Python,
};

use super::{
    describe_serialized,
    editor::{EditorObserver, MakeupEditor},
    item::{FieldValue, MakeupItem},
    vocabulary::FileVocabularySource,
};
use crate::{
    config::OutfitConfig,
    core::{category::CATEGORY_MAKEUP, init_tracing},
    error::Error,
    utils::data_loader::discover_genders,
    wrapper::comfyui::{types::NODE_STRING, PromptServer},
};

/// 化妆编辑器
#[pyclass(subclass, name = "MakeupEditor")]
pub struct MakeupEditorNode {
    editor: Mutex<MakeupEditor>,
    gender: String,
}

impl PromptServer for MakeupEditorNode {}

#[pymethods]
impl MakeupEditorNode {
    #[new]
    #[pyo3(signature = (gender="female"))]
    fn new(gender: &str) -> Self {
        init_tracing();
        Self {
            editor: Mutex::new(MakeupEditor::new()),
            gender: gender.to_string(),
        }
    }

    #[classattr]
    #[pyo3(name = "RETURN_TYPES")]
    fn return_types() -> (&'static str, &'static str) {
        (NODE_STRING, NODE_STRING)
    }

    #[classattr]
    #[pyo3(name = "RETURN_NAMES")]
    fn return_names() -> (&'static str, &'static str) {
        ("makeup_prompt", "makeup_data")
    }

    #[classattr]
    #[pyo3(name = "CATEGORY")]
    const CATEGORY: &'static str = CATEGORY_MAKEUP;

    #[classattr]
    #[pyo3(name = "DESCRIPTION")]
    fn description() -> &'static str {
        "Edit a list of makeup items. Only enabled items with a type other than 'none' are output."
    }

    #[classattr]
    #[pyo3(name = "FUNCTION")]
    const FUNCTION: &'static str = "execute";

    #[classmethod]
    #[pyo3(name = "INPUT_TYPES")]
    fn input_types(_cls: &Bound<'_, PyType>) -> PyResult<Py<PyDict>> {
        Python::with_gil(|py| {
            let dict = PyDict::new(py);
            dict.set_item("required", {
                let required = PyDict::new(py);
                let mut genders = discover_genders(&OutfitConfig::global().outfit_dir());
                if genders.is_empty() {
                    genders = vec!["female".to_string(), "male".to_string()];
                }
                required.set_item(
                    "gender",
                    (genders, {
                        let gender = PyDict::new(py);
                        gender.set_item("default", "female")?;
                        gender.set_item("tooltip", "Makeup vocabulary to use.")?;
                        gender
                    }),
                )?;
                required
            })?;

            dict.set_item("hidden", {
                let hidden = PyDict::new(py);
                hidden.set_item(
                    "makeup_data",
                    (NODE_STRING, {
                        let makeup_data = PyDict::new(py);
                        makeup_data.set_item("default", "")?;
                        makeup_data.set_item("multiline", false)?;
                        makeup_data
                    }),
                )?;
                hidden
            })?;
            Ok(dict.into())
        })
    }

    #[pyo3(name = "execute", signature = (gender, makeup_data=None))]
    fn execute(
        &mut self,
        py: Python,
        gender: String,
        makeup_data: Option<String>,
    ) -> PyResult<(String, String)> {
        let results = self.makeup_prompt(gender, makeup_data);

        match results {
            Ok(v) => Ok(v),
            Err(e) => {
                error!("MakeupEditor error, {e}");
                if let Err(e) = self.send_error(py, "MakeupEditor".to_string(), e.to_string()) {
                    error!("send error failed, {e}");
                    return Err(PyErr::new::<PyRuntimeError, _>(e.to_string()));
                };
                Err(PyErr::new::<PyRuntimeError, _>(e.to_string()))
            }
        }
    }

    /// 添加条目, 返回新条目的 id
    #[pyo3(signature = (gender=None))]
    fn add_item(&mut self, gender: Option<String>) -> PyResult<u64> {
        if let Some(gender) = gender {
            self.gender = gender;
        }
        let source = FileVocabularySource::for_gender(&OutfitConfig::global().outfit_dir(), &self.gender);
        let item = self.lock()?.add_item(&source);
        Ok(item.id)
    }

    /// 复制条目, 条目不存在时返回 None
    fn duplicate_item(&mut self, id: u64) -> PyResult<Option<u64>> {
        Ok(self.lock()?.duplicate_item(id).ok().map(|item| item.id))
    }

    /// 删除条目, 条目不存在时返回 False
    fn remove_item(&mut self, id: u64) -> PyResult<bool> {
        Ok(self.lock()?.remove_item(id).is_ok())
    }

    fn clear_all(&mut self) -> PyResult<()> {
        self.lock()?.clear_all();
        Ok(())
    }

    /// 修改字段, 条目不存在、字段无效或值既不是 bool 也不是 str 时返回 False
    fn set_field(&mut self, id: u64, field: &str, value: &Bound<'_, PyAny>) -> PyResult<bool> {
        let value = match value.downcast::<PyBool>() {
            Ok(v) => Ok(FieldValue::Bool(v.is_true())),
            Err(_) => value
                .extract::<String>()
                .map(FieldValue::Text)
                .map_err(|e| Error::InvalidField(format!("{field} value, {e}"))),
        };
        self.apply_field(id, field, value)
    }

    /// 从已保存的序列化结果恢复, 无法解析时保持当前状态并返回 False
    fn restore(&mut self, makeup_data: &str) -> PyResult<bool> {
        match self.lock()?.restore(makeup_data) {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!("restore makeup items failed, {e}");
                Ok(false)
            }
        }
    }

    fn serialize(&self) -> PyResult<String> {
        Ok(self.lock()?.serialize().to_string())
    }

    /// 当前全部条目
    fn items<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyList>> {
        let list = PyList::empty(py);
        for item in self.lock()?.items() {
            list.append(item_to_dict(py, item)?)?;
        }
        Ok(list)
    }

    /// 最近一次加载的词表
    fn vocabulary<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let editor = self.lock()?;
        let vocabulary = editor.vocabulary();
        let dict = PyDict::new(py);
        dict.set_item("type", vocabulary.types.clone())?;
        dict.set_item("intensity", vocabulary.intensities.clone())?;
        dict.set_item("color", vocabulary.colors.clone())?;
        Ok(dict)
    }

    /// 注册状态变化回调, 回调参数为新的序列化结果
    fn on_change(&mut self, callback: Py<PyAny>) -> PyResult<()> {
        self.lock()?
            .add_observer(Box::new(PyCallbackObserver(callback)));
        Ok(())
    }

    fn __len__(&self) -> PyResult<usize> {
        Ok(self.lock()?.len())
    }
}

impl MakeupEditorNode {
    fn lock(&self) -> PyResult<MutexGuard<'_, MakeupEditor>> {
        self.editor
            .lock()
            .map_err(|e| PyErr::new::<PyRuntimeError, _>(Error::LockError(e.to_string()).to_string()))
    }

    fn apply_field(
        &mut self,
        id: u64,
        field: &str,
        value: Result<FieldValue, Error>,
    ) -> PyResult<bool> {
        let value = match value {
            Ok(v) => v,
            Err(e) => {
                warn!("set field on item {id} ignored, {e}");
                return Ok(false);
            }
        };
        Ok(self.lock()?.set_field(id, field, value).is_ok())
    }

    /// 生成化妆提示词
    ///
    /// 隐藏字段为空或无法解析时使用编辑器当前状态
    fn makeup_prompt(
        &mut self,
        gender: String,
        makeup_data: Option<String>,
    ) -> Result<(String, String), Error> {
        self.gender = gender;

        let data = makeup_data.filter(|v| !v.trim().is_empty());
        let parsed = data.and_then(|data| match describe_serialized(&data) {
            Ok(parts) => Some((parts, data)),
            Err(e) => {
                warn!("invalid makeup_data, use editor state, {e}");
                None
            }
        });
        let (parts, serialized) = match parsed {
            Some(v) => v,
            None => {
                let current = self
                    .editor
                    .lock()
                    .map_err(|e| Error::LockError(e.to_string()))?
                    .serialize()
                    .to_string();
                (describe_serialized(&current).unwrap_or_default(), current)
            }
        };

        let prompt = if parts.is_empty() {
            String::new()
        } else {
            format!("Makeup: {}", parts.join(", "))
        };
        Ok((prompt, serialized))
    }
}

/// Python 回调
struct PyCallbackObserver(Py<PyAny>);

impl EditorObserver for PyCallbackObserver {
    fn on_change(&self, serialized: &str) {
        Python::with_gil(|py| {
            if let Err(e) = self.0.call1(py, (serialized,)) {
                warn!("makeup change callback failed, {e}");
            }
        });
    }
}

fn item_to_dict<'py>(py: Python<'py>, item: &MakeupItem) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("id", item.id)?;
    dict.set_item("enabled", item.enabled)?;
    dict.set_item("type", &item.r#type)?;
    dict.set_item("intensity", &item.intensity)?;
    dict.set_item("color", &item.color)?;
    Ok(dict)
}
