//! 提示词

pub mod preset;
pub mod prompt_builder;

pub use prompt_builder::PromptBuilder;
