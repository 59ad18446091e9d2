//! 节点错误推送
//!
//! 通过 `server.PromptServer.instance.send_sync` 把错误发给前端,
//! 前端监听 [`EVENT_NAME`] 事件并在画布上提示。

use pyo3::{
    types::{PyAnyMethods, PyDict, PyDictMethods, PyModule},
    Bound, PyResult, PyTypeInfo, Python,
};

/// 前端监听的事件名称
pub const EVENT_NAME: &str = "comfyui-outfit";

/// 可以向前端推送错误的节点
pub trait PromptServer: PyTypeInfo {
    /// 推送 `{type, node, message}`
    fn send_error(&self, py: Python, error_type: String, message: String) -> PyResult<()> {
        let payload = self.error_payload(py, &error_type, &message)?;
        PyModule::import(py, "server")?
            .getattr("PromptServer")?
            .getattr("instance")?
            .call_method1("send_sync", (EVENT_NAME, payload))?;
        Ok(())
    }

    fn error_payload<'py>(
        &self,
        py: Python<'py>,
        error_type: &str,
        message: &str,
    ) -> PyResult<Bound<'py, PyDict>> {
        let payload = PyDict::new(py);
        payload.set_item("type", error_type)?;
        payload.set_item("node", self.node_class_name(py)?)?;
        payload.set_item("message", message)?;
        Ok(payload)
    }

    /// 注册到 ComfyUI 的类名
    fn node_class_name(&self, py: Python) -> PyResult<String> {
        Self::type_object(py).getattr("__name__")?.extract()
    }
}
