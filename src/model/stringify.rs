//! 单行预览文本：节点未展开时显示的值

use serde_json::Value;

/// 数组预览达到该长度（UTF-16 码元数）即替换为占位符
pub const PREVIEW_LIMIT: usize = 40;

/// 数组预览过长时的占位符
pub const TRUNCATED_PLACEHOLDER: &str = "[...]";

/// 缺失值（undefined）的文本
pub const UNDEFINED_TEXT: &str = "undefined";

/// 生成值的预览文本；`None` 表示该位置没有值
pub fn value_to_string(value: Option<&Value>) -> String {
    let Some(value) = value else {
        return UNDEFINED_TEXT.to_string();
    };
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(items) => {
            let joined = items
                .iter()
                .map(|item| value_to_string(Some(item)))
                .collect::<Vec<_>>()
                .join(", ");
            check_length(format!("[{}]", joined))
        }
        // 与 2 空格缩进的结构化输出一致
        Value::Object(_) => serde_json::to_string_pretty(value).unwrap_or_default(),
    }
}

fn check_length(text: String) -> String {
    if text.encode_utf16().count() < PREVIEW_LIMIT {
        text
    } else {
        TRUNCATED_PLACEHOLDER.to_string()
    }
}
