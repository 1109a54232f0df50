//! AppState：双栏对比的核心状态（原始文本、解析结果、展开状态、差异表）
//!
//! 所有计算都在一次输入事件里同步完成：任一侧文本、对比开关或键空间变化时，
//! 重新分配并计算两张差异表，旧表整体丢弃。

use std::path::Path;
use std::time::Instant;

use jsonpath_rust::JsonPath;
use serde_json::Value;
use thiserror::Error;

use crate::model::comparator::{compare, DiffKeying, DiffPair, DifferenceMap};
use crate::model::render_tree::{build_rows, OpenState, RenderContext, TreeRow};
use crate::utils::fs::read_text_file;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON解析失败: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("JSONPath错误: {0}")]
    JsonPath(String),
    #[error("剪贴板错误: {0}")]
    Clipboard(String),
    #[error("状态错误: {0}")]
    State(String),
}

/// 左右两栏
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// 主文档（左）
    Subject,
    /// 参照文档（右）
    Reference,
}

impl Side {
    /// UI 侧用整数区分两栏：0 = 主文档，1 = 参照文档
    pub fn from_index(idx: i32) -> Option<Self> {
        match idx {
            0 => Some(Side::Subject),
            1 => Some(Side::Reference),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Side::Subject => "主文档",
            Side::Reference => "参照文档",
        }
    }
}

/// 一侧文本的解析结果
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ParseState {
    /// 空输入：不显示树，也不报错
    #[default]
    Empty,
    Parsed(Value),
    /// 解析器的原始错误信息
    Failed(String),
}

/// 一栏的状态
#[derive(Debug, Default)]
pub struct Panel {
    pub raw_text: String,
    pub parsed: ParseState,
    pub open: OpenState,
    pub selected_path: Option<String>,
}

impl Panel {
    /// 写入新文本并重新解析；返回预处理后的文本
    fn set_text(&mut self, text: &str) -> &str {
        self.raw_text = unwrap_quoted(text);
        self.parsed = parse_text(&self.raw_text);
        match &self.parsed {
            ParseState::Parsed(v) => self.open.retain_existing(v),
            ParseState::Empty => self.open.clear(),
            // 解析失败时保留展开状态，修正输入后可以恢复
            ParseState::Failed(msg) => tracing::debug!("解析失败: {}", msg),
        }
        &self.raw_text
    }

    pub fn value(&self) -> Option<&Value> {
        match &self.parsed {
            ParseState::Parsed(v) => Some(v),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.parsed {
            ParseState::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

/// 以双引号开头的输入视为被再次编码成字符串的 JSON：去掉外层引号并删除所有反斜杠
pub fn unwrap_quoted(text: &str) -> String {
    let Some(inner) = text.strip_prefix('"') else {
        return text.to_string();
    };
    let inner = inner.strip_suffix('"').unwrap_or(inner);
    inner.replace('\\', "")
}

fn parse_text(text: &str) -> ParseState {
    if text.is_empty() {
        return ParseState::Empty;
    }
    match serde_json::from_str::<Value>(text) {
        Ok(v) => ParseState::Parsed(v),
        Err(e) => ParseState::Failed(e.to_string()),
    }
}

#[derive(Debug)]
pub struct AppState {
    pub subject: Panel,
    pub reference: Panel,
    pub comparison_enabled: bool,
    pub sticky: bool,
    pub keying: DiffKeying,
    pub diffs: DiffPair,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            subject: Panel::default(),
            reference: Panel::default(),
            comparison_enabled: true,
            sticky: false,
            keying: DiffKeying::default(),
            diffs: DiffPair::default(),
        }
    }
}

impl AppState {
    pub fn panel(&self, side: Side) -> &Panel {
        match side {
            Side::Subject => &self.subject,
            Side::Reference => &self.reference,
        }
    }

    fn panel_mut(&mut self, side: Side) -> &mut Panel {
        match side {
            Side::Subject => &mut self.subject,
            Side::Reference => &mut self.reference,
        }
    }

    /// 替换一侧文本，重新解析并重算差异；返回预处理后的文本（UI 需回填）
    pub fn set_text(&mut self, side: Side, text: &str) -> String {
        let raw = self.panel_mut(side).set_text(text).to_string();
        if raw != text {
            tracing::info!("{}: 已去除外层引号与转义", side.label());
        }
        self.recompute_diffs();
        raw
    }

    /// 从文件读取一侧文本
    pub fn load_file(&mut self, side: Side, p: &Path) -> Result<(), AppError> {
        let text = read_text_file(p)?;
        self.set_text(side, &text);
        tracing::info!("{} 已从文件加载: {}", side.label(), p.display());
        Ok(())
    }

    pub fn set_comparison_enabled(&mut self, enabled: bool) {
        self.comparison_enabled = enabled;
        self.recompute_diffs();
    }

    /// 粘滞模式只影响样式，不触发重算
    pub fn set_sticky(&mut self, sticky: bool) {
        self.sticky = sticky;
    }

    pub fn set_keying(&mut self, keying: DiffKeying) {
        self.keying = keying;
        self.recompute_diffs();
    }

    /// 整体重算差异表：仅当对比开启、参照文本非空且两侧都解析为对象时才比较
    pub fn recompute_diffs(&mut self) {
        let start = Instant::now();
        self.diffs = match (self.subject.value(), self.reference.value()) {
            (Some(subject), Some(reference))
                if self.comparison_enabled && !self.reference.raw_text.is_empty() =>
            {
                compare(subject, reference, self.keying)
            }
            _ => DiffPair::default(),
        };
        tracing::info!(
            "差异重算完成: 主文档侧 {} 项，参照侧 {} 项，耗时: {}µs",
            self.diffs.side_a.len(),
            self.diffs.side_b.len(),
            start.elapsed().as_micros()
        );
    }

    /// 每侧渲染时使用的差异表：标注的键都存在于该侧自己的树里。
    /// 主文档用 side_b（主文档独有与不一致的键），参照文档用 side_a（参照独有的键）
    pub fn diff_for(&self, side: Side) -> &DifferenceMap {
        match side {
            Side::Subject => &self.diffs.side_b,
            Side::Reference => &self.diffs.side_a,
        }
    }

    /// 点击节点：记录选中路径；只有可展开的可见节点才切换展开状态。
    /// 返回点击后的展开状态，叶子节点始终为 false
    pub fn toggle_node(&mut self, side: Side, path: &str) -> bool {
        let expandable = self
            .rows(side)
            .iter()
            .any(|r| r.path == path && r.expandable);
        let panel = self.panel_mut(side);
        panel.selected_path = Some(path.to_string());
        if !expandable {
            tracing::debug!("{} 叶子节点被选中: {}", side.label(), path);
            return false;
        }
        let open = panel.open.toggle(path);
        tracing::debug!("{} 节点{}: {}", side.label(), if open { "展开" } else { "折叠" }, path);
        open
    }

    /// 一侧的可见行；解析失败或空输入时没有行
    pub fn rows(&self, side: Side) -> Vec<TreeRow> {
        let panel = self.panel(side);
        let Some(root) = panel.value() else {
            return Vec::new();
        };
        let ctx = RenderContext {
            diff: self.diff_for(side),
            keying: self.keying,
            open: &panel.open,
            sticky: self.sticky,
        };
        build_rows(root, &ctx)
    }

    /// 按 JSONPath 提取一侧第一个匹配节点的 pretty 字符串
    pub fn extract_subtree_pretty(&self, side: Side, json_path: &str) -> Result<String, AppError> {
        let dom = self
            .panel(side)
            .value()
            .ok_or_else(|| AppError::State(format!("{}尚未解析", side.label())))?;
        let hits: Vec<&Value> = dom
            .query(json_path)
            .map_err(|e| AppError::JsonPath(e.to_string()))?;
        let first = hits
            .into_iter()
            .next()
            .ok_or_else(|| AppError::JsonPath("未匹配到任何节点".into()))?;
        Ok(serde_json::to_string_pretty(first)?)
    }

    /// 提取一侧最近点击的节点
    pub fn extract_selected(&self, side: Side) -> Result<String, AppError> {
        let path = self
            .panel(side)
            .selected_path
            .as_deref()
            .ok_or_else(|| AppError::State("尚未选中节点".into()))?;
        self.extract_subtree_pretty(side, path)
    }

    /// 当前差异表的 JSON 报告
    pub fn diff_report(&self) -> Result<String, AppError> {
        Ok(serde_json::to_string_pretty(&self.diffs)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::comparator::DiffCode;
    use crate::model::render_tree::RowClass;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// 创建临时JSON文件用于测试
    fn create_test_json_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("创建临时文件失败");
        file.write_all(content.as_bytes()).expect("写入临时文件失败");
        file
    }

    fn state_with(subject: &str, reference: &str) -> AppState {
        let mut state = AppState::default();
        state.set_text(Side::Subject, subject);
        state.set_text(Side::Reference, reference);
        state
    }

    #[test]
    fn test_unwrap_quoted() {
        assert_eq!(unwrap_quoted(r#""{\"a\":1}""#), r#"{"a":1}"#);
        assert_eq!(unwrap_quoted(r#""{\"a\":1}"#), r#"{"a":1}"#);
        assert_eq!(unwrap_quoted(r#"{"a":"x\\y"}"#), r#"{"a":"x\\y"}"#);
        assert_eq!(unwrap_quoted(""), "");
    }

    #[test]
    fn test_quoted_input_replaces_raw_text() {
        let mut state = AppState::default();
        let raw = state.set_text(Side::Subject, r#""{\"name\":\"温度\"}""#);
        assert_eq!(raw, r#"{"name":"温度"}"#);
        assert_eq!(state.subject.raw_text, raw);
        assert_eq!(state.subject.value(), Some(&serde_json::json!({"name": "温度"})));
    }

    #[test]
    fn test_empty_input_is_not_an_error() {
        let mut state = AppState::default();
        state.set_text(Side::Subject, "");
        assert_eq!(state.subject.parsed, ParseState::Empty);
        assert!(state.subject.error().is_none());
        assert!(state.rows(Side::Subject).is_empty());
    }

    #[test]
    fn test_parse_failure_surfaces_parser_message() {
        let bad = r#"{"a": }"#;
        let expected = serde_json::from_str::<Value>(bad).unwrap_err().to_string();

        let mut state = AppState::default();
        state.set_text(Side::Subject, bad);
        assert_eq!(state.subject.error(), Some(expected.as_str()));
        assert!(state.rows(Side::Subject).is_empty(), "解析失败不渲染树");

        state.set_text(Side::Subject, r#"{"a": 1}"#);
        assert!(state.subject.error().is_none(), "修正输入后应该恢复");
        assert_eq!(state.rows(Side::Subject).len(), 1);
    }

    #[test]
    fn test_maps_oriented_per_side() {
        let state = state_with(r#"{"a": 1, "m": 1}"#, r#"{"b": 1, "m": 2}"#);
        assert_eq!(state.diff_for(Side::Subject).code_for("a"), DiffCode::Missing);
        assert_eq!(state.diff_for(Side::Subject).code_for("m"), DiffCode::Mismatch);
        assert_eq!(state.diff_for(Side::Reference).code_for("b"), DiffCode::Missing);

        let subject_rows = state.rows(Side::Subject);
        let a = subject_rows.iter().find(|r| r.key.as_deref() == Some("a")).unwrap();
        assert_eq!(a.class, RowClass::Highlighted, "主文档独有的键应该高亮");
        assert!(!a.value_highlighted);
        let m = subject_rows.iter().find(|r| r.key.as_deref() == Some("m")).unwrap();
        assert_eq!(m.class, RowClass::Highlighted);
        assert!(m.value_highlighted, "不一致的值应该高亮");

        let reference_rows = state.rows(Side::Reference);
        let b = reference_rows.iter().find(|r| r.key.as_deref() == Some("b")).unwrap();
        assert_eq!(b.class, RowClass::Highlighted, "参照独有的键应该高亮");
        assert!(!b.value_highlighted);
        // 不一致只记在主文档一侧
        let m = reference_rows.iter().find(|r| r.key.as_deref() == Some("m")).unwrap();
        assert_eq!(m.class, RowClass::Level(0));
    }

    #[test]
    fn test_clicking_leaf_never_opens_it_later() {
        let mut state = state_with(r#"{"o": 1}"#, "");
        assert!(!state.toggle_node(Side::Subject, "$.o"), "叶子节点不能展开");
        assert!(state.subject.open.is_empty());
        assert_eq!(state.subject.selected_path.as_deref(), Some("$.o"));

        state.set_text(Side::Subject, r#"{"o": {"k": 1}}"#);
        let rows = state.rows(Side::Subject);
        assert_eq!(rows.len(), 1, "变成对象后应该仍是折叠状态");
        assert!(!rows[0].open);
    }

    #[test]
    fn test_clicking_hidden_node_is_ignored() {
        let mut state = state_with(r#"{"o": {"p": {"k": 1}}}"#, "");
        // $.o 未展开，$.o.p 不可见
        assert!(!state.toggle_node(Side::Subject, "$.o.p"));
        assert!(state.subject.open.is_empty());
    }

    #[test]
    fn test_extract_key_with_backslash() {
        let mut state = AppState::default();
        state.set_text(Side::Subject, r#"{"a\\b": {"k": 1}}"#);
        let rows = state.rows(Side::Subject);
        assert_eq!(rows[0].key.as_deref(), Some("a\\b"));
        let text = state.extract_subtree_pretty(Side::Subject, &rows[0].path).expect("提取失败");
        assert_eq!(text, "{\n  \"k\": 1\n}");
    }

    #[test]
    fn test_comparison_disabled_forces_empty_maps() {
        let mut state = state_with(r#"{"a": 1}"#, r#"{"b": 1}"#);
        assert!(!state.diffs.is_empty());
        state.set_comparison_enabled(false);
        assert!(state.diffs.is_empty());
        state.set_comparison_enabled(true);
        assert!(!state.diffs.is_empty());
    }

    #[test]
    fn test_empty_reference_forces_empty_maps() {
        let state = state_with(r#"{"a": 1}"#, "");
        assert!(state.diffs.is_empty());
    }

    #[test]
    fn test_failed_or_non_object_side_forces_empty_maps() {
        assert!(state_with(r#"{"a": 1}"#, "{oops").diffs.is_empty());
        assert!(state_with("[1, 2]", r#"{"a": 1}"#).diffs.is_empty());
    }

    #[test]
    fn test_each_pass_replaces_previous_maps() {
        let mut state = state_with(r#"{"a": 1, "x": 1}"#, r#"{"a": 2}"#);
        assert_eq!(state.diffs.side_b.len(), 2);
        state.set_text(Side::Subject, r#"{"a": 2}"#);
        assert!(state.diffs.is_empty(), "旧标注不应残留");
    }

    #[test]
    fn test_keying_switch_recomputes() {
        let mut state = state_with(r#"{"a": {"x": 1}, "x": 2}"#, r#"{"a": {"x": 5}, "x": 2}"#);
        assert_eq!(state.diffs.side_b.code_for("x"), DiffCode::Mismatch);
        state.set_keying(DiffKeying::Path);
        assert_eq!(state.diffs.side_b.code_for("x"), DiffCode::None);
        assert_eq!(state.diffs.side_b.code_for("$.a.x"), DiffCode::Mismatch);
    }

    #[test]
    fn test_sticky_does_not_touch_diffs() {
        let mut state = state_with(r#"{"o": {"k": 1}}"#, r#"{"o": {"k": 2}}"#);
        let before = state.diffs.clone();
        state.toggle_node(Side::Subject, "$.o");
        state.set_sticky(true);
        assert_eq!(state.diffs, before);
        assert!(state.rows(Side::Subject)[0].sticky);
    }

    #[test]
    fn test_toggle_survives_compatible_edit_and_resets_on_structural_change() {
        let mut state = state_with(r#"{"o": {"k": 1}}"#, "");
        assert!(state.toggle_node(Side::Subject, "$.o"));
        assert_eq!(state.rows(Side::Subject).len(), 2);

        state.set_text(Side::Subject, r#"{"o": {"k": 2, "j": 3}}"#);
        assert_eq!(state.rows(Side::Subject).len(), 3);

        state.set_text(Side::Subject, r#"{"o": 1}"#);
        state.set_text(Side::Subject, r#"{"o": {"k": 1}}"#);
        assert_eq!(state.rows(Side::Subject).len(), 1, "结构变化后应该重置为折叠");
    }

    #[test]
    fn test_load_file_into_side() {
        let temp_file = create_test_json_file(r#"{"sensor": "s1", "value": 42}"#);
        let mut state = AppState::default();
        state.load_file(Side::Reference, temp_file.path()).expect("加载文件失败");
        assert_eq!(state.rows(Side::Reference).len(), 2);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let mut state = AppState::default();
        let result = state.load_file(Side::Subject, Path::new("/definitely/not/here.json"));
        assert!(matches!(result, Err(AppError::Io(_))));
    }

    #[test]
    fn test_extract_subtree() {
        let state = state_with(r#"{"user": {"name": "张三"}, "list": [{"id": 1}]}"#, "");
        let user = state.extract_subtree_pretty(Side::Subject, "$.user").expect("提取失败");
        assert!(user.contains("张三"));
        let id = state.extract_subtree_pretty(Side::Subject, "$.list[0].id").expect("提取失败");
        assert_eq!(id, "1");
        assert!(state.extract_subtree_pretty(Side::Subject, "$.nonexistent").is_err());
        assert!(matches!(
            state.extract_subtree_pretty(Side::Reference, "$"),
            Err(AppError::State(_))
        ));
    }

    #[test]
    fn test_extract_selected_requires_click() {
        let mut state = state_with(r#"{"o": {"k": 1}}"#, "");
        assert!(state.extract_selected(Side::Subject).is_err());
        state.toggle_node(Side::Subject, "$.o");
        let text = state.extract_selected(Side::Subject).expect("提取失败");
        assert_eq!(text, "{\n  \"k\": 1\n}");
    }

    #[test]
    fn test_diff_report() {
        let state = state_with(r#"{"a": 1}"#, r#"{"b": 1}"#);
        let report: Value = serde_json::from_str(&state.diff_report().unwrap()).unwrap();
        assert_eq!(report["side_a"]["b"], "missing");
        assert_eq!(report["side_b"]["a"], "missing");
    }

    #[test]
    fn test_side_from_index() {
        assert_eq!(Side::from_index(0), Some(Side::Subject));
        assert_eq!(Side::from_index(1), Some(Side::Reference));
        assert_eq!(Side::from_index(2), None);
    }
}
