//! Benchmarks for task graph construction and validation.
//!
//! Mirrors the teacher's `graph_compile` benchmark shape: build graphs of
//! increasing width/depth and measure `TaskGraphBuilder::build`, which is
//! where acyclicity and dangling-reference checks run.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use schedsim::graph::TaskGraphBuilder;

/// `Start -> N1 -> N2 -> ... -> Nn`, each task feeding one output into the next.
fn build_linear_graph(depth: usize) -> TaskGraphBuilder {
    let mut builder = TaskGraphBuilder::new();
    let mut prev_output = None;
    for i in 0..depth {
        let task = builder.add_task(format!("task-{i}"), 1.0, 1);
        if let Some(output) = prev_output {
            builder.add_input(task, output);
        }
        prev_output = Some(builder.add_output(task, 1.0));
    }
    builder
}

/// One source task feeding `width` independent sinks.
fn build_fanout_graph(width: usize) -> TaskGraphBuilder {
    let mut builder = TaskGraphBuilder::new();
    let source = builder.add_task("source", 1.0, 1);
    let output = builder.add_output(source, 1.0);
    for i in 0..width {
        let sink = builder.add_task(format!("sink-{i}"), 1.0, 1);
        builder.add_input(sink, output);
    }
    builder
}

fn graph_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_build_linear");
    for &depth in &[16usize, 256, 4096] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            b.iter(|| build_linear_graph(depth).build().unwrap());
        });
    }
    group.finish();

    let mut group = c.benchmark_group("graph_build_fanout");
    for &width in &[16usize, 256, 4096] {
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, &width| {
            b.iter(|| build_fanout_graph(width).build().unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, graph_build);
criterion_main!(benches);
