//! VM桥接层：连接Slint UI与AppState数据模型
//!
//! 注意：此模块的具体实现在main.rs中，因为依赖于Slint生成的类型
//! 这里只提供公共常量

// === 常量定义（消除魔法值） ===
pub const STATUS_READY: &str = "就绪：在左右两栏粘贴 JSON";
pub const STATUS_COMPARED: &str = "对比完成";
pub const STATUS_COMPARE_OFF: &str = "对比已关闭";
pub const STATUS_WAITING_REFERENCE: &str = "等待参照文档";
pub const STATUS_LOADED: &str = "文件加载完成";
pub const STATUS_COPIED: &str = "已复制到剪贴板";
pub const STATUS_ERROR_PREFIX: &str = "错误: ";

pub const WINDOW_TITLE: &str = "JSON 对比";
