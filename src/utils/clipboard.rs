//! Clipboard: 节点内容与差异报告的复制

use crate::model::data_core::AppError;

/// 将文本复制到系统剪贴板
pub fn copy_to_clipboard(text: &str) -> Result<(), AppError> {
    use copypasta::{ClipboardContext, ClipboardProvider};
    let mut ctx = ClipboardContext::new().map_err(|e| AppError::Clipboard(e.to_string()))?;
    ctx.set_contents(text.to_string())
        .map_err(|e| AppError::Clipboard(e.to_string()))
}

/// 从系统剪贴板获取文本（用于测试）
#[cfg(test)]
pub fn get_clipboard_contents() -> Result<String, AppError> {
    use copypasta::{ClipboardContext, ClipboardProvider};
    let mut ctx = ClipboardContext::new().map_err(|e| AppError::Clipboard(e.to_string()))?;
    ctx.get_contents()
        .map_err(|e| AppError::Clipboard(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore = "需要桌面会话中的系统剪贴板"]
    fn test_copy_diff_report() {
        let report = "{\n  \"side_a\": {\n    \"b\": \"missing\"\n  }\n}";

        copy_to_clipboard(report).expect("复制到剪贴板应该成功");
        let clipboard_content = get_clipboard_contents().expect("从剪贴板读取应该成功");
        assert_eq!(clipboard_content, report, "剪贴板内容应该与复制的文本一致");
    }

    #[test]
    #[ignore = "需要桌面会话中的系统剪贴板"]
    fn test_copy_unicode_node() {
        let node = "\"温度传感器 ✨\"";

        copy_to_clipboard(node).expect("复制Unicode文本应该成功");
        let clipboard_content = get_clipboard_contents().expect("从剪贴板读取应该成功");
        assert_eq!(clipboard_content, node);
    }
}
