//! JSON对比工具库
//!
//! 提供两棵JSON树的结构对比、可折叠渲染树与差异标注叠加功能
//! 遵循MVVM架构模式：model 只含数据与算法，UI 绑定在 main.rs

pub mod model;
pub mod utils;
pub mod vm;

// 重新导出主要类型
pub use model::comparator::{compare, fuse_array, DiffCode, DiffKeying, DiffPair, DifferenceMap};
pub use model::data_core::{AppError, AppState, ParseState, Side};
pub use model::node::NodeKind;
pub use model::render_tree::{build_rows, OpenState, RenderContext, RowClass, TreeRow};
