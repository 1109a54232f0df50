//! 性能基准测试模块
//!
//! 每次按键都会同步完成"解析 → 对比 → 生成渲染行"，这里测量大文档下各步的耗时

use std::time::Instant;
use serde_json::{json, Value};
use crate::model::comparator::{compare, DiffKeying, DifferenceMap};
use crate::model::data_core::{AppState, Side};
use crate::model::render_tree::{build_rows, OpenState, RenderContext};

/// 性能测试结果
#[derive(Debug)]
pub struct PerformanceResult {
    pub operation: String,
    pub duration_ms: u128,
    pub success: bool,
    pub details: String,
}

impl PerformanceResult {
    pub fn new(operation: &str, duration_ms: u128, success: bool, details: &str) -> Self {
        Self {
            operation: operation.to_string(),
            duration_ms,
            success,
            details: details.to_string(),
        }
    }
}

/// 生成大型测试JSON数据；`seed` 改变部分叶子值，便于制造差异
pub fn generate_large_json(depth: usize, width: usize, seed: i64) -> Value {
    fn create_nested_object(current_depth: usize, max_depth: usize, width: usize, seed: i64) -> Value {
        if current_depth >= max_depth {
            return json!("叶子节点值");
        }

        let mut obj = serde_json::Map::new();
        for i in 0..width {
            let key = format!("field_{}_{}", current_depth, i);
            let value = match i % 5 {
                0 => json!(format!("字符串值_{}", i)),
                1 => json!(i as i64 + seed),
                2 => json!(i % 2 == 0),
                3 => json!([{"id": i, "seed": seed}, {"extra": i}]),
                _ => create_nested_object(current_depth + 1, max_depth, width / 2, seed),
            };
            obj.insert(key, value);
        }
        Value::Object(obj)
    }

    let mut root = serde_json::Map::new();
    root.insert("metadata".to_string(), json!({
        "depth": depth,
        "width": width,
        "seed": seed
    }));
    root.insert("data".to_string(), create_nested_object(0, depth, width, seed));

    let items: Vec<Value> = (0..width * 10)
        .map(|i| json!({
            "id": i,
            "name": format!("项目_{}", i),
            "value": i as i64 * 2 + seed,
        }))
        .collect();
    root.insert("items".to_string(), json!(items));

    Value::Object(root)
}

/// 测试一次完整对比的耗时
pub fn benchmark_compare(subject: &Value, reference: &Value, keying: DiffKeying) -> PerformanceResult {
    let start = Instant::now();
    let pair = compare(subject, reference, keying);
    let duration = start.elapsed();

    PerformanceResult::new(
        &format!("结构对比({:?})", keying),
        duration.as_millis(),
        true,
        &format!("主文档侧 {} 项，参照侧 {} 项", pair.side_a.len(), pair.side_b.len()),
    )
}

/// 测试全部展开时生成渲染行的耗时
pub fn benchmark_build_rows(doc: &Value) -> PerformanceResult {
    let diff = DifferenceMap::default();
    let mut open = OpenState::default();
    // 逐层展开，直到没有新的可展开行
    loop {
        let ctx = RenderContext {
            diff: &diff,
            keying: DiffKeying::Flat,
            open: &open,
            sticky: false,
        };
        let closed: Vec<String> = build_rows(doc, &ctx)
            .into_iter()
            .filter(|r| r.expandable && !r.open)
            .map(|r| r.path)
            .collect();
        if closed.is_empty() {
            break;
        }
        for p in &closed {
            open.toggle(p);
        }
    }

    let start = Instant::now();
    let ctx = RenderContext {
        diff: &diff,
        keying: DiffKeying::Flat,
        open: &open,
        sticky: false,
    };
    let rows = build_rows(doc, &ctx);
    let duration = start.elapsed();

    PerformanceResult::new(
        "渲染行构建",
        duration.as_millis(),
        !rows.is_empty(),
        &format!("构建了 {} 行，展开 {} 个节点", rows.len(), open.len()),
    )
}

/// 测试一次按键的完整同步流程（解析 + 对比）
pub fn benchmark_keystroke(state: &mut AppState, subject_text: &str) -> PerformanceResult {
    let start = Instant::now();
    state.set_text(Side::Subject, subject_text);
    let duration = start.elapsed();

    PerformanceResult::new(
        "按键重算",
        duration.as_millis(),
        state.subject.error().is_none(),
        &format!("处理了 {} 字节", subject_text.len()),
    )
}

/// 运行综合性能测试
pub fn run_performance_suite() -> Vec<PerformanceResult> {
    let mut results = Vec::new();
    let test_cases = [(3, 10), (4, 20), (5, 30)];

    for (depth, width) in test_cases {
        tracing::info!("测试规模：深度{}，宽度{}", depth, width);
        let subject = generate_large_json(depth, width, 0);
        let reference = generate_large_json(depth, width, 1);

        results.push(benchmark_compare(&subject, &reference, DiffKeying::Flat));
        results.push(benchmark_compare(&subject, &reference, DiffKeying::Path));
        results.push(benchmark_build_rows(&subject));

        let mut state = AppState::default();
        state.set_text(Side::Reference, &reference.to_string());
        results.push(benchmark_keystroke(&mut state, &subject.to_string()));
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_large_json() {
        let json = generate_large_json(2, 3, 0);
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("metadata"));
        assert!(obj.contains_key("data"));
        assert!(obj.contains_key("items"));
    }

    #[test]
    fn test_seeded_documents_differ() {
        let a = generate_large_json(2, 5, 0);
        let b = generate_large_json(2, 5, 1);
        let pair = compare(&a, &b, DiffKeying::Path);
        assert!(pair.side_a.is_empty());
        assert!(!pair.side_b.is_empty());
    }

    #[test]
    fn test_performance_benchmarks() {
        let subject = generate_large_json(2, 5, 0);
        let reference = generate_large_json(2, 5, 3);

        let cmp = benchmark_compare(&subject, &reference, DiffKeying::Flat);
        assert!(cmp.success);
        assert!(cmp.duration_ms < 1000);

        let rows = benchmark_build_rows(&subject);
        assert!(rows.success, "{}", rows.details);
        assert!(rows.duration_ms < 1000);

        let mut state = AppState::default();
        state.set_text(Side::Reference, &reference.to_string());
        let key = benchmark_keystroke(&mut state, &subject.to_string());
        assert!(key.success);
        assert!(!state.diffs.is_empty());
    }

    #[test]
    fn test_run_performance_suite() {
        let results = run_performance_suite();
        assert_eq!(results.len(), 12);
        for r in &results {
            assert!(r.success, "{} 失败: {}", r.operation, r.details);
        }
    }
}
