//! 错误处理

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // 标准库错误处理
    #[error("io error, {0}")]
    Io(std::io::Error),
    // std::sync::poison::mutex
    #[error("lock error, {0}")]
    LockError(String),
    #[error("strum error, {0}")]
    ParseEnumString(String),

    #[error("serde json error, {0}")]
    SerdeJsonError(#[from] serde_json::Error),
    #[error("regex error, {0}")]
    RegexError(#[from] regex::Error),
    #[error("http request error, {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("py error, {0}")]
    PyErr(#[from] pyo3::PyErr),
    #[error("pythonize error, {0}")]
    PythonizeError(#[from] pythonize::PythonizeError),

    // 化妆编辑器
    #[error("makeup item not found, id: {0}")]
    ItemNotFound(u64),
    #[error("invalid makeup field, {0}")]
    InvalidField(String),

    #[error("malformed document, {0}")]
    MalformedDocument(String),
    #[error("file not found, {0}")]
    FileNotFound(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
