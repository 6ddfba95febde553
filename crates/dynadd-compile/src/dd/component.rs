//! Atomic building blocks of decoupling sequences.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use dynadd_ir::{
    CircuitDag, CustomGate, Instruction, PulseSchedule, QubitId, StandardGate, TimeUnit,
};

use crate::backend::Calibration;
use crate::error::{CompileError, CompileResult};
use crate::time::to_ticks_rounded;

/// One element of a decoupling sequence.
///
/// Only [`Component::Delay`] can be stretched; gates and pulses take the
/// time the hardware calibration says they take.
#[derive(Debug, Clone)]
pub enum Component {
    /// Idle for a number of ticks.
    Delay(u64),
    /// A standard gate, translated into the backend basis.
    Gate(GateComponent),
    /// A custom gate realized by an explicit pulse schedule.
    Pulse(PulseComponent),
}

/// A single-qubit gate expressed in the native basis of a backend.
#[derive(Clone)]
pub struct GateComponent {
    name: String,
    fragment: Arc<CircuitDag>,
    backend: Arc<dyn Calibration>,
}

impl fmt::Debug for GateComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateComponent")
            .field("name", &self.name)
            .field("ops", &self.fragment.num_ops())
            .field("backend", &self.backend.name())
            .finish()
    }
}

/// A pulse-calibrated custom gate, one schedule per hardware qubit tuple.
#[derive(Debug, Clone)]
pub struct PulseComponent {
    name: String,
    schedules: Arc<FxHashMap<Vec<u32>, PulseSchedule>>,
}

impl Component {
    /// A scalable delay with a placeholder duration of one tick.
    pub fn delay() -> Self {
        Component::Delay(1)
    }

    /// A gate component from a parameterless single-qubit gate name.
    ///
    /// The name is matched case-insensitively.
    pub fn gate(name: &str, backend: Arc<dyn Calibration>) -> CompileResult<Self> {
        let name = name.to_ascii_lowercase();
        let gate = StandardGate::from_name(&name)
            .filter(|g| g.num_qubits() == 1)
            .ok_or_else(|| CompileError::GateNotFound(name.clone()))?;

        let mut fragment = CircuitDag::with_size(1, 0);
        for inst in backend.translate_to_basis(&gate)? {
            fragment.apply(inst)?;
        }

        Ok(Component::Gate(GateComponent {
            name,
            fragment: Arc::new(fragment),
            backend,
        }))
    }

    /// A pulse component from per-qubit-tuple schedules.
    pub fn pulse(
        name: impl Into<String>,
        schedules: FxHashMap<Vec<u32>, PulseSchedule>,
    ) -> Self {
        Component::Pulse(PulseComponent {
            name: name.into(),
            schedules: Arc::new(schedules),
        })
    }

    /// Component name.
    pub fn name(&self) -> &str {
        match self {
            Component::Delay(_) => "delay",
            Component::Gate(g) => &g.name,
            Component::Pulse(p) => &p.name,
        }
    }

    /// Whether the duration can be changed with [`scale_to`](Self::scale_to).
    #[inline]
    pub fn is_scalable(&self) -> bool {
        matches!(self, Component::Delay(_))
    }

    /// Duration in ticks when applied on hardware `qubits`.
    pub fn duration(&self, qubits: &[u32]) -> CompileResult<u64> {
        match self {
            Component::Delay(ticks) => Ok(*ticks),
            Component::Gate(g) => g.duration(qubits),
            Component::Pulse(p) => p
                .schedules
                .get(qubits)
                .map(PulseSchedule::duration)
                .ok_or_else(|| CompileError::MissingPulseSchedule {
                    gate: p.name.clone(),
                    qubits: qubits.to_vec(),
                }),
        }
    }

    /// A copy of this component lasting exactly `ticks`.
    pub fn scale_to(&self, ticks: u64) -> CompileResult<Self> {
        match self {
            Component::Delay(_) => Ok(Component::Delay(ticks)),
            other => Err(CompileError::ComponentNotScalable(other.name().to_string())),
        }
    }

    /// Append this component to `fragment` on `local` qubits.
    ///
    /// `hardware` names the qubits the fragment will finally run on; it
    /// selects calibrations and names pulse gates.
    #[allow(clippy::cast_possible_truncation)]
    pub fn apply(
        &self,
        fragment: &mut CircuitDag,
        hardware: &[u32],
        local: &[QubitId],
    ) -> CompileResult<()> {
        match self {
            Component::Delay(0) => {}
            Component::Delay(ticks) => {
                for &q in local {
                    fragment.apply(Instruction::delay_ticks(q, *ticks))?;
                }
            }
            Component::Gate(g) => {
                fragment.compose(&g.fragment, local)?;
            }
            Component::Pulse(p) => {
                let schedule = p.schedules.get(hardware).ok_or_else(|| {
                    CompileError::MissingPulseSchedule {
                        gate: p.name.clone(),
                        qubits: hardware.to_vec(),
                    }
                })?;
                let gate_name = pulse_gate_name(&schedule.name, hardware);
                fragment.apply(Instruction::gate(
                    CustomGate::new(gate_name.clone(), local.len() as u32),
                    local.iter().copied(),
                ))?;
                fragment.add_calibration(gate_name, local.iter().copied(), schedule.clone());
            }
        }
        Ok(())
    }
}

impl GateComponent {
    /// Critical path of the translated fragment on `qubits`.
    fn duration(&self, qubits: &[u32]) -> CompileResult<u64> {
        let mut ends = vec![0.0_f64; self.fragment.num_qubits()];

        for (_, inst) in self.fragment.topological_ops() {
            if inst.is_measure() {
                continue;
            }
            let mut hw = Vec::with_capacity(inst.qubits.len());
            for q in &inst.qubits {
                let mapped = qubits.get(q.index() as usize).copied().ok_or_else(|| {
                    CompileError::InvalidSequence(format!(
                        "gate '{}' needs {} qubits, got {}",
                        self.name,
                        self.fragment.num_qubits(),
                        qubits.len()
                    ))
                })?;
                hw.push(mapped);
            }

            let start = inst
                .qubits
                .iter()
                .map(|q| ends[q.index() as usize])
                .fold(0.0, f64::max);
            let end = start + self.backend.gate_length(inst.name(), &hw)?;
            for q in &inst.qubits {
                ends[q.index() as usize] = end;
            }
        }

        let seconds = ends.into_iter().fold(0.0, f64::max);
        Ok(to_ticks_rounded(
            seconds,
            TimeUnit::S,
            self.backend.tick_length(),
        ))
    }
}

/// Name of the custom gate carrying `schedule` on `hardware` qubits.
pub fn pulse_gate_name(schedule: &str, hardware: &[u32]) -> String {
    let mut name = schedule.to_string();
    for q in hardware {
        name.push('_');
        name.push_str(&q.to_string());
    }
    name
}
