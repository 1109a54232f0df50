//! 渲染树：把一棵 JSON 值投影成可展开/折叠的行列表，并叠加差异标注
//!
//! 每个节点用带下标的 JSONPath（如 `$.a[0].x`）作身份，展开状态按身份保存在
//! [`OpenState`] 中，与 UI 组件的生命周期无关。重新解析后，身份不再对应可展开
//! 节点的状态会被清除；仍然存在的节点保持原来的展开状态。

use std::collections::HashSet;

use serde_json::Value;

use crate::model::comparator::{DiffCode, DiffKeying, DifferenceMap};
use crate::model::node::{field_path, fused_path, index_path, NodeKind, ROOT_PATH};
use crate::model::stringify::value_to_string;

/// 层级配色循环的色带数
pub const DEPTH_BANDS: u32 = 4;

/// 一棵树的展开状态：已展开节点的身份路径集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenState(HashSet<String>);

impl OpenState {
    pub fn is_open(&self, path: &str) -> bool {
        self.0.contains(path)
    }

    /// 切换展开状态，返回切换后的状态
    pub fn toggle(&mut self, path: &str) -> bool {
        if self.0.remove(path) {
            false
        } else {
            self.0.insert(path.to_string());
            true
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// 只保留在新树里仍是可展开节点的路径
    pub fn retain_existing(&mut self, root: &Value) {
        let mut live = HashSet::new();
        match root {
            Value::Object(map) => {
                for (k, v) in map {
                    collect_expandable(v, field_path(ROOT_PATH, k), &mut live);
                }
            }
            other => collect_expandable(other, ROOT_PATH.to_string(), &mut live),
        }
        let before = self.0.len();
        self.0.retain(|p| live.contains(p));
        if self.0.len() != before {
            tracing::debug!("展开状态清理: {} -> {}", before, self.0.len());
        }
    }
}

fn collect_expandable(v: &Value, path: String, live: &mut HashSet<String>) {
    match v {
        Value::Object(map) => {
            for (k, child) in map {
                collect_expandable(child, field_path(&path, k), live);
            }
        }
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                if let Value::Object(fields) = item {
                    let item_path = index_path(&path, idx);
                    for (k, child) in fields {
                        collect_expandable(child, field_path(&item_path, k), live);
                    }
                }
            }
        }
        _ => return,
    }
    live.insert(path);
}

/// 行的样式类：有差异时高亮，覆盖层级色带
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowClass {
    Highlighted,
    /// 色带编号 0..DEPTH_BANDS
    Level(u8),
}

impl RowClass {
    pub fn name(self) -> &'static str {
        match self {
            RowClass::Highlighted => "highlight",
            RowClass::Level(0) => "level1",
            RowClass::Level(1) => "level2",
            RowClass::Level(2) => "level3",
            RowClass::Level(_) => "level4",
        }
    }

    /// 色带编号；高亮行返回 `None`
    pub fn band(self) -> Option<u8> {
        match self {
            RowClass::Highlighted => None,
            RowClass::Level(b) => Some(b),
        }
    }
}

/// 一个可见节点
#[derive(Debug, Clone, PartialEq)]
pub struct TreeRow {
    /// 字段名；合成根节点没有
    pub key: Option<String>,
    /// 身份路径（带数组下标，唯一）
    pub path: String,
    /// 在差异表里查找用的键
    pub diff_key: Option<String>,
    pub depth: u32,
    pub kind: NodeKind,
    /// 单行预览
    pub text: String,
    pub expandable: bool,
    pub open: bool,
    pub code: DiffCode,
    pub class: RowClass,
    /// 值本身是否高亮（仅不一致时）
    pub value_highlighted: bool,
    pub sticky: bool,
}

impl TreeRow {
    pub fn class_names(&self) -> Vec<&'static str> {
        let mut names = vec!["mainBlock", self.class.name()];
        if self.sticky {
            names.push("sticky");
        }
        names
    }
}

/// 构建一侧的渲染行所需的输入
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub diff: &'a DifferenceMap,
    pub keying: DiffKeying,
    pub open: &'a OpenState,
    pub sticky: bool,
}

/// 按显示顺序生成可见行；折叠节点的子树不输出
///
/// 对象根的成员各自作为深度 0 的节点；其他根作为一个无字段名的节点。
pub fn build_rows(root: &Value, ctx: &RenderContext<'_>) -> Vec<TreeRow> {
    let mut out = Vec::new();
    match root {
        Value::Object(map) => {
            for (k, v) in map {
                push_node(&mut out, ctx, Some(k), v, field_path(ROOT_PATH, k), ROOT_PATH, 0);
            }
        }
        other => push_node(&mut out, ctx, None, other, ROOT_PATH.to_string(), ROOT_PATH, 0),
    }
    out
}

fn push_node(
    out: &mut Vec<TreeRow>,
    ctx: &RenderContext<'_>,
    key: Option<&str>,
    value: &Value,
    path: String,
    diff_parent: &str,
    depth: u32,
) {
    let diff_key = key.map(|k| ctx.keying.key_for(diff_parent, k));
    let diff_path = match key {
        Some(k) => field_path(diff_parent, k),
        None => diff_parent.to_string(),
    };
    let code = diff_key
        .as_deref()
        .map(|k| ctx.diff.code_for(k))
        .unwrap_or_default();

    let kind = NodeKind::of(value);
    let expandable = kind.is_composite();
    let open = expandable && ctx.open.is_open(&path);
    let class = if code == DiffCode::None {
        RowClass::Level((depth % DEPTH_BANDS) as u8)
    } else {
        RowClass::Highlighted
    };

    out.push(TreeRow {
        key: key.map(str::to_string),
        path: path.clone(),
        diff_key,
        depth,
        kind,
        text: value_to_string(Some(value)),
        expandable,
        open,
        code,
        class,
        value_highlighted: code == DiffCode::Mismatch,
        sticky: open && ctx.sticky,
    });

    if !open {
        return;
    }

    match value {
        // 数组元素不单独成行，对象元素的字段直接挂在数组节点下
        Value::Array(items) => {
            let fused = fused_path(&diff_path);
            for (idx, item) in items.iter().enumerate() {
                if let Value::Object(fields) = item {
                    let item_path = index_path(&path, idx);
                    for (k, v) in fields {
                        push_node(out, ctx, Some(k), v, field_path(&item_path, k), &fused, depth + 1);
                    }
                }
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                push_node(out, ctx, Some(k), v, field_path(&path, k), &diff_path, depth + 1);
            }
        }
        _ => {}
    }
}
