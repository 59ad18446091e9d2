//! 公共库
//!
//! 相关节点定义: ComfyUI/comfy/comfy_types/node_typing.py

pub mod category;
pub mod node;

/// 初始化日志
///
/// 每个扩展模块有独立的全局变量, 需要自行设置记录器; 重复调用无副作用
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_ansi(true)
        .with_max_level(tracing::Level::DEBUG)
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .try_init();
}
