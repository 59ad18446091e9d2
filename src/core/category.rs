//! 节点分类

/// 服装
pub const CATEGORY_OUTFIT: &str = "Wizdroid/Outfits";
/// 化妆
pub const CATEGORY_MAKEUP: &str = "Wizdroid/Makeup";
/// 辅助节点, 如 LLM 提示词润色
pub const CATEGORY_SUPPORT: &str = "Wizdroid/Support";
