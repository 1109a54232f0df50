pub mod comparator;
pub mod data_core;
pub mod node;
pub mod performance;
pub mod render_tree;
pub mod stringify;
