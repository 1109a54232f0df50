//! 结构比较器：递归对比两棵 JSON 树，产出两侧的差异标注表
//!
//! side_a 记录"主文档缺失"的键（仅存在于参照文档），
//! side_b 记录"参照文档缺失"的键以及两侧都有但类型/值不同的键。
//! 渲染时 side_b 叠加到主文档栏，side_a 叠加到参照文档栏，标注的键都在该栏自己的树里。
//! 每次比较都分配新的差异表，经 `&mut DiffPair` 显式穿过整棵递归调用树。

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::model::node::{field_path, fused_path, NodeKind, ROOT_PATH};

/// 单个键的比较结论
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffCode {
    #[default]
    None,
    /// 键只存在于一侧
    Missing,
    /// 两侧都有，但类型或标量值不同
    Mismatch,
}

/// 差异表的键空间
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffKeying {
    /// 旧行为：只用字段名作键，不同深度的同名键互相覆盖，后写者胜
    #[default]
    Flat,
    /// 用 JSONPath 作键（数组融合段记为 `[*]`），消除跨深度冲突
    Path,
}

impl DiffKeying {
    /// 由父路径与字段名得到差异表中的键
    pub fn key_for(self, parent: &str, field: &str) -> String {
        match self {
            DiffKeying::Flat => field.to_string(),
            DiffKeying::Path => field_path(parent, field),
        }
    }
}

/// 一侧的差异表：键 → 差异码
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DifferenceMap(BTreeMap<String, DiffCode>);

impl DifferenceMap {
    /// 写入一条标注，同键覆盖
    pub fn record(&mut self, key: String, code: DiffCode) {
        self.0.insert(key, code);
    }

    /// 未记录的键视为 `DiffCode::None`
    pub fn code_for(&self, key: &str) -> DiffCode {
        self.0.get(key).copied().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, DiffCode)> {
        self.0.iter().map(|(k, c)| (k.as_str(), *c))
    }
}

/// 一次比较产出的两侧差异表
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffPair {
    /// 仅存在于参照文档的键（主文档缺失）
    pub side_a: DifferenceMap,
    /// 仅存在于主文档的键（参照缺失），以及不一致的键
    pub side_b: DifferenceMap,
}

impl DiffPair {
    pub fn is_empty(&self) -> bool {
        self.side_a.is_empty() && self.side_b.is_empty()
    }
}

/// 比较主文档与参照文档；任一根不是对象时返回两张空表
pub fn compare(subject: &Value, reference: &Value, keying: DiffKeying) -> DiffPair {
    let mut out = DiffPair::default();
    match (subject, reference) {
        (Value::Object(s), Value::Object(r)) => compare_objects(s, r, ROOT_PATH, keying, &mut out),
        _ => tracing::debug!("比较跳过：根节点不是对象"),
    }
    out
}

fn compare_objects(
    subject: &Map<String, Value>,
    reference: &Map<String, Value>,
    parent: &str,
    keying: DiffKeying,
    out: &mut DiffPair,
) {
    for (key, s_val) in subject {
        let Some(r_val) = reference.get(key) else {
            out.side_b.record(keying.key_for(parent, key), DiffCode::Missing);
            continue;
        };

        if NodeKind::of(s_val) != NodeKind::of(r_val) {
            out.side_b.record(keying.key_for(parent, key), DiffCode::Mismatch);
            continue;
        }

        match (s_val, r_val) {
            (Value::Array(s_items), Value::Array(r_items)) => {
                let fused_parent = fused_path(&field_path(parent, key));
                compare_objects(
                    &fuse_array(s_items),
                    &fuse_array(r_items),
                    &fused_parent,
                    keying,
                    out,
                );
            }
            (Value::Object(s_obj), Value::Object(r_obj)) => {
                compare_objects(s_obj, r_obj, &field_path(parent, key), keying, out);
            }
            _ => {
                if !scalar_eq(s_val, r_val) {
                    out.side_b.record(keying.key_for(parent, key), DiffCode::Mismatch);
                }
            }
        }
    }

    // 主文档里没出现过的参照键
    for key in reference.keys().filter(|k| !subject.contains_key(k.as_str())) {
        out.side_a.record(keying.key_for(parent, key), DiffCode::Missing);
    }
}

/// 数组融合：把所有对象元素的字段从左到右合并成一个对象，后出现的同名字段覆盖前者。
/// 非对象元素被忽略，元素下标不参与比较。
pub fn fuse_array(items: &[Value]) -> Map<String, Value> {
    let mut merged = Map::new();
    for item in items {
        if let Value::Object(fields) = item {
            for (k, v) in fields {
                merged.insert(k.clone(), v.clone());
            }
        }
    }
    merged
}

/// 标量相等；数字按数值比较（1 与 1.0 相等）
fn scalar_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(fx), Some(fy)) => fx == fy,
            _ => x == y,
        },
        _ => a == b,
    }
}
