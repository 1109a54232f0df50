//! IO helper: 读取待对比的 JSON 文本

use std::{fs::File, io::{BufReader, Read}, path::Path};

use crate::model::data_core::AppError;

/// 读取文件全文；不在这里解析，解析错误由面板自行展示
pub fn read_text_file(p: &Path) -> Result<String, AppError> {
    let f = File::open(p)?;
    let mut rdr = BufReader::new(f);
    let mut text = String::new();
    rdr.read_to_string(&mut text)?;
    // 编辑器保存的文件常带 BOM
    Ok(text.trim_start_matches('\u{feff}').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_text_strips_bom() {
        let mut file = NamedTempFile::new().expect("创建临时文件失败");
        file.write_all("\u{feff}{\"a\": 1}".as_bytes()).expect("写入临时文件失败");
        let text = read_text_file(file.path()).expect("读取失败");
        assert_eq!(text, "{\"a\": 1}");
    }

    #[test]
    fn test_read_keeps_invalid_json_verbatim() {
        let mut file = NamedTempFile::new().expect("创建临时文件失败");
        file.write_all(b"not json").expect("写入临时文件失败");
        assert_eq!(read_text_file(file.path()).unwrap(), "not json");
    }
}
