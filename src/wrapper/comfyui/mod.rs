//! ComfyUI 相关封装

mod prompt_server;
pub use prompt_server::PromptServer;

mod node_input;
pub use node_input::InputKwargs;

pub mod types;
