use annexome::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

/// A festivals-shaped table with `rows` rows, cycling through the fixture values.
fn festivals_table(rows: usize) -> RowSet {
    let source = get_dataset("festivals").unwrap();
    let mut table = Table::new("festivals", source.schema().clone());
    for i in 0..rows {
        let record = source.get(i % source.len()).unwrap();
        table
            .append_row(record.values().into_iter().cloned().collect())
            .unwrap();
    }
    RowSet::all(Arc::new(table))
}

fn bench_apply_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_filters");
    let predicates = vec![
        Predicate::equals(fields::festivals::MONTH, "Nov"),
        Predicate::all(fields::festivals::STATE),
        Predicate::range(fields::festivals::DURATION_DAYS, 3.0, 10.0),
        Predicate::compare(fields::festivals::EXPECTED_VISITORS, CompareOp::Gt, 20000.0),
    ];

    for size in [10, 1000, 10000].iter() {
        let rows = festivals_table(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| apply_filters(black_box(&rows), black_box(&predicates)).unwrap());
        });
    }
    group.finish();
}

fn bench_parse_predicates(c: &mut Criterion) {
    let text = "Region == 'South' AND Tourist_Interest BETWEEN 40 AND 90 \
                AND Preservation_Status IN ('High', 'Medium') AND Practitioners > 3000";
    c.bench_function("parse_predicates", |b| {
        b.iter(|| parse_predicates(black_box(text)).unwrap());
    });
}

fn bench_build_view(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_view");
    let specs = [
        ("grouped_count", ViewSpec::grouped_count(fields::festivals::MONTH)),
        (
            "top_n_sorted",
            ViewSpec::top_n(
                fields::festivals::FESTIVAL,
                fields::festivals::EXPECTED_VISITORS,
                TopNOptions::default().sorted(fields::festivals::EXPECTED_VISITORS, true),
            ),
        ),
        ("summary", ViewSpec::summary(fields::festivals::EXPECTED_VISITORS)),
    ];

    let rows = festivals_table(10000);
    for (name, spec) in specs.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(name), spec, |b, spec| {
            b.iter(|| build_view(black_box(&rows), spec).unwrap());
        });
    }
    group.finish();
}

fn bench_priority_view(c: &mut Criterion) {
    let gems = get_dataset("hidden_gems").unwrap();
    let spec = ViewSpec::Priority(PriorityRule::hidden_gems());
    c.bench_function("priority_hidden_gems", |b| {
        b.iter(|| build_view(black_box(&gems), &spec).unwrap());
    });
}

criterion_group!(
    benches,
    bench_apply_filters,
    bench_parse_predicates,
    bench_build_view,
    bench_priority_view,
);

criterion_main!(benches);
