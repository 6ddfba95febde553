//! End-to-end tests of the decoupling pipeline.
//!
//! Each test drives real circuits through the passes and checks the
//! per-qubit timelines of the result.

use std::sync::Arc;

use dynadd_compile::passes::{BarriersToDelays, MergeDelays};
use dynadd_compile::{
    BackendProperties, BasisGates, Calibration, DdPassManagerBuilder, FlagFundamentalState, Pass,
    PropertySet, Scheme, SchemeOptions, SchedulingMethod, build_scheme, insert_dd,
};
use dynadd_ir::{
    Circuit, CircuitDag, CircuitRecord, ClbitId, PulseSchedule, QubitId, TimeUnit,
};

/// Three-qubit backend at 1 ns per tick with calibrated `x` pulses.
fn backend() -> Arc<dyn Calibration> {
    let mut b = BackendProperties::new("line3", 3, 1e-9, BasisGates::ibm())
        .with_uniform_gate_length("x", 40e-9)
        .with_uniform_gate_length("sx", 20e-9)
        .with_uniform_gate_length("rz", 0.0)
        .with_uniform_gate_length("reset", 1e-6)
        .with_gate_length("cx", [0, 1], 160e-9)
        .with_gate_length("cx", [1, 2], 160e-9);
    for q in 0..3 {
        b = b.with_pulse_calibration("x", [q], PulseSchedule::new("x").play("drag", 40));
    }
    Arc::new(b)
}

/// (name, delay ticks) for every op on `q`; non-delays report 0.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn timeline(dag: &CircuitDag, q: u32) -> Vec<(String, u64)> {
    dag.ops_on_qubit(QubitId(q))
        .into_iter()
        .map(|inst| {
            let ticks = inst.delay_duration().map_or(0, |(d, _)| d as u64);
            (inst.name().to_string(), ticks)
        })
        .collect()
}

fn names(dag: &CircuitDag, q: u32) -> Vec<String> {
    timeline(dag, q).into_iter().map(|(n, _)| n).collect()
}

fn delay(ticks: u64) -> (String, u64) {
    ("delay".to_string(), ticks)
}

fn op(name: &str) -> (String, u64) {
    (name.to_string(), 0)
}

// ============================================================================
// Scheduling
// ============================================================================

#[test]
fn test_alap_barrier_scenario() {
    // 3-tick and 2-tick gates around a barrier on q0, q1 idle throughout
    let backend: Arc<dyn Calibration> = Arc::new(
        BackendProperties::new("ticks", 2, 1e-9, BasisGates::ibm())
            .with_uniform_gate_length("x", 3e-9)
            .with_uniform_gate_length("sx", 2e-9),
    );
    let mut c = Circuit::with_size("scenario", 2, 0);
    c.x(QubitId(0))
        .unwrap()
        .barrier_all()
        .unwrap()
        .sx(QubitId(0))
        .unwrap();

    let scheduled = BarriersToDelays::new(backend, SchedulingMethod::Alap)
        .rewrite(c.dag())
        .unwrap();

    assert_eq!(timeline(&scheduled, 0), vec![op("x"), op("sx")]);
    assert_eq!(timeline(&scheduled, 1), vec![delay(3), delay(2)]);

    let merged = MergeDelays::new(1e-9).rewrite(&scheduled).unwrap();
    assert_eq!(timeline(&merged, 1), vec![delay(5)]);
}

#[test]
fn test_every_qubit_ends_at_schedule_length() {
    let mut c = Circuit::with_size("c", 3, 0);
    c.x(QubitId(0))
        .unwrap()
        .cx(QubitId(0), QubitId(1))
        .unwrap()
        .sx(QubitId(2))
        .unwrap();

    for method in [SchedulingMethod::Asap, SchedulingMethod::Alap] {
        let out = BarriersToDelays::new(backend(), method)
            .rewrite(c.dag())
            .unwrap();
        let lengths: Vec<u64> = (0..3)
            .map(|q| {
                timeline(&out, q)
                    .into_iter()
                    .map(|(name, ticks)| match name.as_str() {
                        "x" => 40,
                        "sx" => 20,
                        "cx" => 160,
                        _ => ticks,
                    })
                    .sum()
            })
            .collect();
        assert_eq!(lengths, vec![200, 200, 200], "{method}");
    }
}

// ============================================================================
// Full pipeline
// ============================================================================

/// cx(0,1) then five x on q0, measured: q1 idles 200 ticks after the cx.
fn idle_after_cx() -> Circuit {
    let mut c = Circuit::with_size("idle", 2, 2);
    c.cx(QubitId(0), QubitId(1)).unwrap();
    for _ in 0..5 {
        c.x(QubitId(0)).unwrap();
    }
    c.measure(QubitId(0), ClbitId(0))
        .unwrap()
        .measure(QubitId(1), ClbitId(1))
        .unwrap();
    c
}

#[test]
fn test_hahn_echo_splices_calibrated_pulse() {
    let backend = backend();
    let seq = build_scheme(Scheme::HahnEcho, &SchemeOptions::default(), backend.clone()).unwrap();
    let mut dag = idle_after_cx().into_dag();
    insert_dd(&mut dag, backend, seq, SchedulingMethod::Alap).unwrap();

    assert_eq!(
        timeline(&dag, 1),
        vec![
            op("cx"),
            delay(80),
            op("y_gate_1"),
            delay(80),
            op("measure"),
        ]
    );
    let cal = dag.calibration("y_gate_1", &[QubitId(1)]).unwrap();
    assert_eq!(cal.duration(), 40);
    dag.verify_integrity().unwrap();
}

#[test]
fn test_xy4_window_split() {
    let backend = backend();
    let seq = build_scheme(Scheme::Xy4Gate, &SchemeOptions::default(), backend.clone()).unwrap();

    let mut c = Circuit::with_size("c", 1, 0);
    c.delay_ticks(QubitId(0), 400).unwrap();
    let mut dag = c.into_dag();
    insert_dd(&mut dag, backend, seq, SchedulingMethod::Alap).unwrap();

    // four 40-tick pulses leave 240 ticks for weights 0.5, 1, 1, 1, 0.5
    let delays: Vec<u64> = timeline(&dag, 0)
        .into_iter()
        .filter(|(n, _)| n == "delay")
        .map(|(_, t)| t)
        .collect();
    assert_eq!(delays, vec![30, 60, 60, 60, 30]);
    // y translates to rz then x on an IBM basis
    assert_eq!(
        names(&dag, 0),
        vec!["delay", "x", "delay", "rz", "x", "delay", "x", "delay", "rz", "x", "delay"]
    );
}

#[test]
fn test_window_too_short_is_left_alone() {
    let backend = backend();
    let seq = build_scheme(Scheme::Xy4Gate, &SchemeOptions::default(), backend.clone()).unwrap();

    let mut c = Circuit::with_size("c", 1, 0);
    c.delay_ticks(QubitId(0), 160).unwrap();
    let mut dag = c.into_dag();
    let props = insert_dd(&mut dag, backend, seq, SchedulingMethod::Alap).unwrap();

    assert_eq!(timeline(&dag, 0), vec![delay(160)]);
    assert_eq!(props.dd_report().unwrap().delays_replaced, 0);
}

#[test]
fn test_kdd_calibrations_land_on_hardware_qubit() {
    let backend = backend();
    let seq = build_scheme(Scheme::Kdd, &SchemeOptions::default(), backend.clone()).unwrap();

    let mut c = Circuit::with_size("c", 3, 0);
    c.delay_ticks(QubitId(2), 2000).unwrap();
    let mut dag = c.into_dag();
    insert_dd(&mut dag, backend, seq, SchedulingMethod::Alap).unwrap();

    for gate in ["x_pi_6_2", "x_2", "x_pi_2_2", "rz_2_2", "rz_-2_2", "rz_-3_2"] {
        assert!(
            dag.calibration(gate, &[QubitId(2)]).is_some(),
            "missing calibration for {gate}"
        );
    }
    assert!(dag.ops_on_qubit(QubitId(0)).is_empty());
}

#[test]
fn test_ground_state_flags_across_reset() {
    let mut c = Circuit::with_size("c", 1, 0);
    c.x(QubitId(0))
        .unwrap()
        .reset(QubitId(0))
        .unwrap()
        .delay(QubitId(0), 80.0, TimeUnit::Ns)
        .unwrap();

    let mut dag = c.into_dag();
    let mut props = PropertySet::new();
    FlagFundamentalState.run(&mut dag, &mut props).unwrap();
    let flags = props.fundamental_state.as_ref().unwrap();

    let by_name: Vec<(String, bool)> = dag
        .topological_ops()
        .map(|(n, i)| (i.name().to_string(), flags.get(n).unwrap()))
        .collect();
    assert_eq!(
        by_name,
        vec![
            ("x".to_string(), false),
            ("reset".to_string(), false),
            ("delay".to_string(), true),
        ]
    );
}

#[test]
fn test_ground_state_flags_survive_splicing() {
    let mut c = Circuit::with_size("c", 2, 0);
    for _ in 0..5 {
        c.x(QubitId(0)).unwrap();
    }

    let backend = backend();
    let seq = build_scheme(Scheme::HahnEcho, &SchemeOptions::default(), backend.clone()).unwrap();
    let mut dag = c.into_dag();
    let props = insert_dd(&mut dag, backend, seq, SchedulingMethod::Alap).unwrap();

    let report = props.dd_report().copied().unwrap();
    assert_eq!(report.delays_replaced, 1);
    assert_eq!(report.ground_state_delays, 1);
    assert_eq!(names(&dag, 1), vec!["delay", "y_gate_1", "delay"]);

    // the idle window on q1 is still reported as ground state after the splice
    let flags = props.fundamental_state.as_ref().unwrap();
    assert_eq!(flags.len(), dag.num_ops());
    let q1_flags: Vec<Option<bool>> = dag
        .topological_ops()
        .filter(|(_, inst)| inst.qubits == vec![QubitId(1)])
        .map(|(n, _)| flags.get(n))
        .collect();
    assert_eq!(q1_flags, vec![Some(true); 3]);
    assert_eq!(flags.ground_count(), 3 * report.ground_state_delays);
}

#[test]
fn test_pipeline_preserves_existing_calibrations() {
    let mut c = idle_after_cx();
    c.add_calibration("custom", [QubitId(0)], PulseSchedule::new("custom").play("w", 8));

    let backend = backend();
    let seq = build_scheme(Scheme::CpmgPulse, &SchemeOptions::default(), backend.clone()).unwrap();
    let (pm, mut props) = DdPassManagerBuilder::new(backend, seq).build();
    let mut dag = c.into_dag();
    pm.run(&mut dag, &mut props).unwrap();

    assert!(dag.calibration("custom", &[QubitId(0)]).is_some());
    assert!(dag.calibration("y_gate_1", &[QubitId(1)]).is_some());
}

#[test]
fn test_record_through_pipeline() {
    let record = CircuitRecord::from(&idle_after_cx());
    let json = serde_json::to_string(&record).unwrap();
    let loaded: CircuitRecord = serde_json::from_str(&json).unwrap();

    let backend = backend();
    let seq = build_scheme(Scheme::HahnEcho, &SchemeOptions::default(), backend.clone()).unwrap();
    let mut dag = loaded.into_dag().unwrap();
    insert_dd(&mut dag, backend, seq, SchedulingMethod::Alap).unwrap();

    let out = CircuitRecord::from_dag("idle", &dag);
    assert_eq!(out.num_qubits, 2);
    assert_eq!(out.calibrations.len(), 1);
    assert_eq!(out.calibrations[0].gate, "y_gate_1");

    let reloaded: CircuitRecord =
        serde_json::from_str(&serde_json::to_string(&out).unwrap()).unwrap();
    assert_eq!(reloaded.into_dag().unwrap().num_ops(), dag.num_ops());
}

#[test]
fn test_missing_gate_length_aborts() {
    let mut c = Circuit::with_size("c", 1, 0);
    c.h(QubitId(0)).unwrap();

    let backend = backend();
    let seq = build_scheme(Scheme::CarrPurcell, &SchemeOptions::default(), backend.clone()).unwrap();
    let mut dag = c.into_dag();
    assert!(insert_dd(&mut dag, backend, seq, SchedulingMethod::Alap).is_err());
}
