use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mackerel_telemetry::{build_graph_definition, is_system_metric, GraphDefOptions, MetricName};

fn bench_matching(c: &mut Criterion) {
    let pattern = MetricName::parse("interface.*.rxBytes.delta");
    c.bench_function("match_pattern", |b| {
        b.iter(|| pattern.matches(black_box("interface.eth0.rxBytes.delta")))
    });
}

fn bench_catalog(c: &mut Criterion) {
    c.bench_function("is_system_metric_hit", |b| {
        b.iter(|| is_system_metric(black_box("filesystem.dev_sda1.used")))
    });
    c.bench_function("is_system_metric_miss", |b| {
        b.iter(|| is_system_metric(black_box("checkout.payment.latency")))
    });
}

fn bench_graph_definition(c: &mut Criterion) {
    let options = GraphDefOptions {
        display_name: Some("disk.*".to_string()),
        ..Default::default()
    };
    c.bench_function("build_graph_definition", |b| {
        b.iter(|| build_graph_definition(black_box("disk.sda.reads.delta"), &options))
    });
}

criterion_group!(benches, bench_matching, bench_catalog, bench_graph_definition);
criterion_main!(benches);
