//! Scheduling pass: replace barriers and alignment gaps by explicit delays.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::trace;

use dynadd_ir::{CircuitDag, Instruction, QubitId, TimeUnit};

use crate::backend::Calibration;
use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;
use crate::time::{DEFAULT_ALIGNMENT_TOLERANCE, to_ticks_exact};

/// Direction in which operations are packed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SchedulingMethod {
    /// As late as possible: idle time goes before operations.
    #[default]
    Alap,
    /// As soon as possible: idle time goes after operations.
    Asap,
}

impl fmt::Display for SchedulingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulingMethod::Alap => f.write_str("alap"),
            SchedulingMethod::Asap => f.write_str("asap"),
        }
    }
}

impl FromStr for SchedulingMethod {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "alap" => Ok(SchedulingMethod::Alap),
            "asap" => Ok(SchedulingMethod::Asap),
            other => Err(CompileError::InvalidOption(format!(
                "unknown scheduling method '{other}', expected 'alap' or 'asap'"
            ))),
        }
    }
}

/// Schedule the circuit against calibrated gate lengths.
///
/// Every qubit carries a running clock. An operation starts when the last of
/// its qubits is free; lagging qubits are padded with delays first. A
/// barrier synchronizes all qubits to the latest clock and is then dropped.
/// Measurements pass through without advancing any clock. At the end every
/// qubit is padded up to the overall schedule length.
///
/// With [`SchedulingMethod::Alap`] the walk runs from the end of the circuit
/// backwards, so padding lands before operations instead of after them.
pub struct BarriersToDelays {
    backend: Arc<dyn Calibration>,
    scheduling: SchedulingMethod,
}

impl BarriersToDelays {
    /// Create the pass for `backend`.
    pub fn new(backend: Arc<dyn Calibration>, scheduling: SchedulingMethod) -> Self {
        Self {
            backend,
            scheduling,
        }
    }

    /// Scheduling direction.
    pub fn scheduling(&self) -> SchedulingMethod {
        self.scheduling
    }

    /// Duration of `inst` in ticks. Delays keep their own length.
    fn duration(&self, inst: &Instruction) -> CompileResult<u64> {
        let tick = self.backend.tick_length();
        if let Some((duration, unit)) = inst.delay_duration() {
            return to_ticks_exact(duration, unit, tick, DEFAULT_ALIGNMENT_TOLERANCE);
        }
        let seconds = self
            .backend
            .gate_length(inst.name(), &inst.qubit_indices())?;
        to_ticks_exact(seconds, TimeUnit::S, tick, DEFAULT_ALIGNMENT_TOLERANCE)
    }

    /// Build the scheduled copy of `dag`.
    pub fn rewrite(&self, dag: &CircuitDag) -> CompileResult<CircuitDag> {
        let mut ops: Vec<&Instruction> = dag.topological_ops().map(|(_, inst)| inst).collect();
        if self.scheduling == SchedulingMethod::Alap {
            ops.reverse();
        }

        let mut clock: FxHashMap<QubitId, u64> = dag.qubits().map(|q| (q, 0)).collect();
        let mut emitted: Vec<Instruction> = Vec::with_capacity(ops.len());

        for inst in ops {
            if inst.is_barrier() {
                let latest = clock.values().copied().max().unwrap_or(0);
                trace!("barrier on {:?}: sync to {}", inst.qubits, latest);
                pad_to(&mut clock, dag.qubits(), latest, &mut emitted);
                continue;
            }
            if inst.is_measure() {
                emitted.push(inst.clone());
                continue;
            }

            let duration = self.duration(inst)?;
            let start = inst
                .qubits
                .iter()
                .map(|q| clock.get(q).copied().unwrap_or(0))
                .max()
                .unwrap_or(0);
            pad_to(&mut clock, inst.qubits.iter().copied(), start, &mut emitted);
            trace!(
                "{} on {:?}: [{}, {})",
                inst.name(),
                inst.qubits,
                start,
                start + duration
            );
            emitted.push(inst.clone());
            for q in &inst.qubits {
                clock.insert(*q, start + duration);
            }
        }

        let length = clock.values().copied().max().unwrap_or(0);
        pad_to(&mut clock, dag.qubits(), length, &mut emitted);

        if self.scheduling == SchedulingMethod::Alap {
            emitted.reverse();
        }

        let mut out = dag.copy_empty_like();
        for inst in emitted {
            out.apply(inst)?;
        }
        Ok(out)
    }
}

/// Pad every qubit in `qubits` that lags behind `target`.
fn pad_to(
    clock: &mut FxHashMap<QubitId, u64>,
    qubits: impl IntoIterator<Item = QubitId>,
    target: u64,
    emitted: &mut Vec<Instruction>,
) {
    for q in qubits {
        let now = clock.entry(q).or_insert(0);
        if *now < target {
            emitted.push(Instruction::delay_ticks(q, target - *now));
            *now = target;
        }
    }
}

impl Pass for BarriersToDelays {
    fn name(&self) -> &'static str {
        "BarriersToDelays"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, dag: &mut CircuitDag, _properties: &mut PropertySet) -> CompileResult<()> {
        *dag = self.rewrite(dag)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendProperties;
    use crate::property::BasisGates;
    use dynadd_ir::{Circuit, ClbitId};

    fn backend() -> Arc<dyn Calibration> {
        Arc::new(
            BackendProperties::new("toy", 2, 1e-9, BasisGates::ibm())
                .with_uniform_gate_length("x", 40e-9)
                .with_uniform_gate_length("sx", 20e-9)
                .with_gate_length("cx", [0, 1], 160e-9),
        )
    }

    /// (name, ticks) of every op on `q`, delays reporting their length.
    fn timeline(dag: &CircuitDag, q: u32) -> Vec<(String, u64)> {
        dag.ops_on_qubit(QubitId(q))
            .into_iter()
            .map(|inst| {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let ticks = inst.delay_duration().map_or(0, |(d, _)| d as u64);
                (inst.name().to_string(), ticks)
            })
            .collect()
    }

    fn delay(ticks: u64) -> (String, u64) {
        ("delay".to_string(), ticks)
    }

    fn op(name: &str) -> (String, u64) {
        (name.to_string(), 0)
    }

    #[test]
    fn test_asap_pads_after() {
        let mut c = Circuit::with_size("c", 2, 0);
        c.x(QubitId(0)).unwrap().sx(QubitId(1)).unwrap();

        let pass = BarriersToDelays::new(backend(), SchedulingMethod::Asap);
        let out = pass.rewrite(c.dag()).unwrap();

        assert_eq!(timeline(&out, 0), vec![op("x")]);
        assert_eq!(timeline(&out, 1), vec![op("sx"), delay(20)]);
    }

    #[test]
    fn test_alap_pads_before() {
        let mut c = Circuit::with_size("c", 2, 0);
        c.x(QubitId(0)).unwrap().sx(QubitId(1)).unwrap();

        let pass = BarriersToDelays::new(backend(), SchedulingMethod::Alap);
        let out = pass.rewrite(c.dag()).unwrap();

        assert_eq!(timeline(&out, 1), vec![delay(20), op("sx")]);
    }

    #[test]
    fn test_two_qubit_gate_waits_for_both() {
        let mut c = Circuit::with_size("c", 2, 0);
        c.x(QubitId(0)).unwrap().cx(QubitId(0), QubitId(1)).unwrap();

        let pass = BarriersToDelays::new(backend(), SchedulingMethod::Asap);
        let out = pass.rewrite(c.dag()).unwrap();

        assert_eq!(timeline(&out, 0), vec![op("x"), op("cx")]);
        assert_eq!(timeline(&out, 1), vec![delay(40), op("cx")]);
    }

    #[test]
    fn test_barrier_dropped_and_synchronizes() {
        let mut c = Circuit::with_size("c", 2, 0);
        c.x(QubitId(0))
            .unwrap()
            .barrier_all()
            .unwrap()
            .sx(QubitId(1))
            .unwrap();

        let pass = BarriersToDelays::new(backend(), SchedulingMethod::Asap);
        let out = pass.rewrite(c.dag()).unwrap();

        assert!(out.topological_ops().all(|(_, i)| !i.is_barrier()));
        assert_eq!(timeline(&out, 0), vec![op("x"), delay(20)]);
        assert_eq!(timeline(&out, 1), vec![delay(40), op("sx")]);
    }

    #[test]
    fn test_existing_delay_counts_as_busy_time() {
        let mut c = Circuit::with_size("c", 2, 0);
        c.delay(QubitId(0), 100.0, TimeUnit::Ns)
            .unwrap()
            .x(QubitId(1))
            .unwrap();

        let pass = BarriersToDelays::new(backend(), SchedulingMethod::Asap);
        let out = pass.rewrite(c.dag()).unwrap();

        assert_eq!(timeline(&out, 1), vec![op("x"), delay(60)]);
    }

    #[test]
    fn test_measure_takes_no_time() {
        let mut c = Circuit::with_size("c", 2, 1);
        c.x(QubitId(0))
            .unwrap()
            .measure(QubitId(0), ClbitId(0))
            .unwrap();

        let pass = BarriersToDelays::new(backend(), SchedulingMethod::Asap);
        let out = pass.rewrite(c.dag()).unwrap();

        assert_eq!(timeline(&out, 0), vec![op("x"), op("measure")]);
        assert_eq!(timeline(&out, 1), vec![delay(40)]);
    }

    #[test]
    fn test_misaligned_length_rejected() {
        let backend: Arc<dyn Calibration> = Arc::new(
            BackendProperties::new("toy", 1, 1e-9, BasisGates::ibm())
                .with_uniform_gate_length("x", 40.5e-9),
        );
        let mut c = Circuit::with_size("c", 1, 0);
        c.x(QubitId(0)).unwrap();

        let err = BarriersToDelays::new(backend, SchedulingMethod::Asap)
            .rewrite(c.dag())
            .unwrap_err();
        assert!(matches!(err, CompileError::TimingAlignment { .. }));
    }

    #[test]
    fn test_missing_length_rejected() {
        let mut c = Circuit::with_size("c", 1, 0);
        c.h(QubitId(0)).unwrap();

        let err = BarriersToDelays::new(backend(), SchedulingMethod::Asap)
            .rewrite(c.dag())
            .unwrap_err();
        assert!(matches!(err, CompileError::MissingGateLength { .. }));
    }

    #[test]
    fn test_scheduling_method_parse() {
        assert_eq!("ALAP".parse::<SchedulingMethod>().unwrap(), SchedulingMethod::Alap);
        assert_eq!("asap".parse::<SchedulingMethod>().unwrap(), SchedulingMethod::Asap);
        assert!("later".parse::<SchedulingMethod>().is_err());
        assert_eq!(SchedulingMethod::default().to_string(), "alap");
    }
}
