//! 编辑器诊断输出
//!
//! 编辑器不直接写全局日志, 通过 [`DiagnosticSink`] 注入, 测试中可以断言警告内容。

use std::sync::{Arc, Mutex};

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Warn,
}

pub trait DiagnosticSink: Send {
    fn emit(&self, level: Level, message: &str);

    fn debug(&self, message: &str) {
        self.emit(Level::Debug, message);
    }

    fn warn(&self, message: &str) {
        self.emit(Level::Warn, message);
    }
}

/// 转发到 `log`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&self, level: Level, message: &str) {
        match level {
            Level::Debug => log::debug!(target: "makeup_editor", "{message}"),
            Level::Warn => log::warn!(target: "makeup_editor", "{message}"),
        }
    }
}

/// 记录全部诊断信息, 克隆后共享同一份记录
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    records: Arc<Mutex<Vec<(Level, String)>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(Level, String)> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn warnings(&self) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|(level, _)| *level == Level::Warn)
            .map(|(_, message)| message)
            .collect()
    }
}

impl DiagnosticSink for RecordingSink {
    fn emit(&self, level: Level, message: &str) {
        let mut records = match self.records.lock() {
            Ok(records) => records,
            Err(poisoned) => poisoned.into_inner(),
        };
        records.push((level, message.to_string()));
    }
}
