//! 工具

pub mod data_loader;
pub mod json_file;
pub mod options;
pub mod seed;
