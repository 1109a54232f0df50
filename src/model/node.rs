//! 节点基础：运行时类型分类与 JSONPath 路径拼接，比较器与渲染树共用

use serde_json::Value;

/// 根节点路径
pub const ROOT_PATH: &str = "$";

/// 数组融合后子字段所挂的路径段（位置信息被丢弃）
pub const FUSED_SEGMENT: &str = "[*]";

/// JSON 节点运行时类型（与 UI 展示解耦）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Object,
    Array,
    String,
    Number,
    Bool,
    Null,
}

impl NodeKind {
    pub fn of(v: &Value) -> Self {
        match v {
            Value::Object(_) => NodeKind::Object,
            Value::Array(_) => NodeKind::Array,
            Value::String(_) => NodeKind::String,
            Value::Number(_) => NodeKind::Number,
            Value::Bool(_) => NodeKind::Bool,
            Value::Null => NodeKind::Null,
        }
    }

    /// 复合类型（对象/数组）才可展开；null 永远不可展开
    pub fn is_composite(self) -> bool {
        matches!(self, NodeKind::Object | NodeKind::Array)
    }
}

/// 在父路径后追加字段段；字段含特殊字符时使用 bracket-notation
pub fn field_path(parent: &str, key: &str) -> String {
    if !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        format!("{}.{}", parent, key)
    } else {
        format!("{}['{}']", parent, key.replace('\\', "\\\\").replace('\'', "\\'"))
    }
}

/// 在父路径后追加数组下标段
pub fn index_path(parent: &str, idx: usize) -> String {
    format!("{}[{}]", parent, idx)
}

/// 融合数组的路径：所有元素共享同一段
pub fn fused_path(parent: &str) -> String {
    format!("{}{}", parent, FUSED_SEGMENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_of_each_variant() {
        assert_eq!(NodeKind::of(&json!({})), NodeKind::Object);
        assert_eq!(NodeKind::of(&json!([])), NodeKind::Array);
        assert_eq!(NodeKind::of(&json!("s")), NodeKind::String);
        assert_eq!(NodeKind::of(&json!(1.5)), NodeKind::Number);
        assert_eq!(NodeKind::of(&json!(false)), NodeKind::Bool);
        assert_eq!(NodeKind::of(&Value::Null), NodeKind::Null);
    }

    #[test]
    fn test_composite_kinds() {
        assert!(NodeKind::Object.is_composite());
        assert!(NodeKind::Array.is_composite());
        assert!(!NodeKind::Null.is_composite());
        assert!(!NodeKind::String.is_composite());
    }

    #[test]
    fn test_path_segments() {
        assert_eq!(field_path(ROOT_PATH, "user"), "$.user");
        assert_eq!(field_path("$.user", "first name"), "$.user['first name']");
        assert_eq!(field_path(ROOT_PATH, "it's"), "$['it\\'s']");
        assert_eq!(field_path(ROOT_PATH, ""), "$['']");
        assert_eq!(field_path(ROOT_PATH, "a\\b"), "$['a\\\\b']");
        assert_eq!(field_path(ROOT_PATH, "a\\'b"), "$['a\\\\\\'b']");
        assert_eq!(index_path("$.items", 2), "$.items[2]");
        assert_eq!(fused_path("$.items"), "$.items[*]");
    }
}
