//! Benchmarks for the decoupling pipeline
//!
//! Run with: cargo bench -p dynadd-compile

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use dynadd_compile::passes::{BarriersToDelays, MergeDelays};
use dynadd_compile::{
    BackendProperties, BasisGates, Calibration, Scheme, SchemeOptions, SchedulingMethod,
    build_scheme, insert_dd,
};
use dynadd_ir::{Circuit, CircuitDag, PulseSchedule, QubitId};

fn backend(n: u32) -> Arc<dyn Calibration> {
    let mut b = BackendProperties::new("bench", n, 1e-9, BasisGates::ibm())
        .with_uniform_gate_length("x", 40e-9)
        .with_uniform_gate_length("rz", 0.0);
    for q in 0..n {
        b = b.with_pulse_calibration("x", [q], PulseSchedule::new("x").play("drag", 40));
        if q + 1 < n {
            b = b.with_gate_length("cx", [q, q + 1], 160e-9);
        }
    }
    Arc::new(b)
}

/// A CX ladder: every qubit idles while the ladder passes elsewhere.
fn ladder(n: u32, rounds: u32) -> CircuitDag {
    let mut circuit = Circuit::with_size("ladder", n, 0);
    for _ in 0..rounds {
        for q in 0..n - 1 {
            circuit.cx(QubitId(q), QubitId(q + 1)).unwrap();
        }
        circuit.barrier_all().unwrap();
    }
    circuit.into_dag()
}

fn bench_scheduling(c: &mut Criterion) {
    let mut group = c.benchmark_group("barriers_to_delays");

    for n in &[5u32, 20, 50] {
        let dag = ladder(*n, 5);
        let pass = BarriersToDelays::new(backend(*n), SchedulingMethod::Alap);
        group.bench_with_input(BenchmarkId::new("alap", n), &dag, |b, dag| {
            b.iter(|| black_box(pass.rewrite(dag).unwrap()));
        });
    }

    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let dag = BarriersToDelays::new(backend(20), SchedulingMethod::Alap)
        .rewrite(&ladder(20, 5))
        .unwrap();
    let pass = MergeDelays::new(1e-9);
    c.bench_function("merge_delays_20x5", |b| {
        b.iter(|| black_box(pass.rewrite(&dag).unwrap()));
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");

    for scheme in [Scheme::Xy4Gate, Scheme::Kdd] {
        let backend = backend(20);
        let seq = build_scheme(scheme, &SchemeOptions::default(), backend.clone()).unwrap();
        let dag = ladder(20, 5);
        group.bench_with_input(BenchmarkId::new("ladder_20x5", scheme), &dag, |b, dag| {
            b.iter(|| {
                let mut dag = dag.clone();
                insert_dd(&mut dag, backend.clone(), seq.clone(), SchedulingMethod::Alap).unwrap();
                black_box(dag)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_scheduling, bench_merge, bench_pipeline);
criterion_main!(benches);
