//! 类型定义
//! 相关节点定义: ComfyUI/comfy/comfy_types/node_typing.py

pub const NODE_INT: &str = "INT";
pub const NODE_STRING: &str = "STRING";
pub const NODE_BOOLEAN: &str = "BOOLEAN";

/// 种子上限, 与前端 2**32 - 1 对齐
pub const NODE_SEED_MAX: u64 = 0xffff_ffff;
