//! Benchmarks for DAG construction and traversal
//!
//! Run with: cargo bench -p dynadd-ir

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use dynadd_ir::{Circuit, CircuitDag, QubitId};

/// Brick-wall circuit with idle qubits between layers.
fn layered(n: u32, layers: u32) -> CircuitDag {
    let mut circuit = Circuit::with_size("layered", n, 0);
    for layer in 0..layers {
        for q in (layer % 2..n.saturating_sub(1)).step_by(2) {
            circuit.cx(QubitId(q), QubitId(q + 1)).unwrap();
        }
        circuit.delay_ticks(QubitId(layer % n), 160).unwrap();
        circuit.barrier_all().unwrap();
    }
    circuit.into_dag()
}

fn bench_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("dag_apply");

    for n in &[5u32, 20, 50] {
        group.bench_with_input(BenchmarkId::new("layered", n), n, |b, &n| {
            b.iter(|| layered(black_box(n), black_box(20)));
        });
    }

    group.finish();
}

fn bench_topological_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("topological_ops");

    for n in &[5u32, 20, 50] {
        let dag = layered(*n, 20);
        group.bench_with_input(BenchmarkId::new("walk", n), &dag, |b, dag| {
            b.iter(|| black_box(dag.topological_ops().count()));
        });
    }

    group.finish();
}

fn bench_reversed(c: &mut Criterion) {
    let dag = layered(20, 20);
    c.bench_function("reversed_20x20", |b| {
        b.iter(|| black_box(dag.reversed().unwrap()));
    });
}

criterion_group!(benches, bench_apply, bench_topological_ops, bench_reversed);
criterion_main!(benches);
