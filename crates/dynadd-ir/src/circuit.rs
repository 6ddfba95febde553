//! High-level circuit builder API and the serialized circuit record.

use serde::{Deserialize, Serialize};

use crate::dag::CircuitDag;
use crate::error::IrResult;
use crate::gate::{Gate, StandardGate};
use crate::instruction::Instruction;
use crate::pulse::PulseSchedule;
use crate::qubit::{ClbitId, QubitId};
use crate::time::TimeUnit;

/// A quantum circuit.
///
/// Thin builder over [`CircuitDag`] with fluent methods for the operations
/// that show up around idle windows: single-qubit Paulis, basis gates,
/// barriers and delays.
#[derive(Debug, Clone)]
pub struct Circuit {
    name: String,
    dag: CircuitDag,
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dag: CircuitDag::new(),
        }
    }

    /// Create a circuit with a given number of qubits and classical bits.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        Self {
            name: name.into(),
            dag: CircuitDag::with_size(num_qubits, num_clbits),
        }
    }

    /// Add the next free qubit.
    pub fn add_qubit(&mut self) -> QubitId {
        let id = QubitId(self.dag.qubits().last().map_or(0, |q| q.0 + 1));
        self.dag.add_qubit(id);
        id
    }

    /// Add the next free classical bit.
    pub fn add_clbit(&mut self) -> ClbitId {
        let id = ClbitId(self.dag.clbits().last().map_or(0, |c| c.0 + 1));
        self.dag.add_clbit(id);
        id
    }

    // =========================================================================
    // Gates
    // =========================================================================

    /// Apply the identity gate.
    pub fn id(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.dag
            .apply(Instruction::single_qubit_gate(StandardGate::I, qubit))?;
        Ok(self)
    }

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.dag
            .apply(Instruction::single_qubit_gate(StandardGate::H, qubit))?;
        Ok(self)
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.dag
            .apply(Instruction::single_qubit_gate(StandardGate::X, qubit))?;
        Ok(self)
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.dag
            .apply(Instruction::single_qubit_gate(StandardGate::Y, qubit))?;
        Ok(self)
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.dag
            .apply(Instruction::single_qubit_gate(StandardGate::Z, qubit))?;
        Ok(self)
    }

    /// Apply √X gate.
    pub fn sx(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.dag
            .apply(Instruction::single_qubit_gate(StandardGate::SX, qubit))?;
        Ok(self)
    }

    /// Apply √X† gate.
    pub fn sxdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.dag
            .apply(Instruction::single_qubit_gate(StandardGate::SXdg, qubit))?;
        Ok(self)
    }

    /// Apply Rz rotation.
    pub fn rz(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.dag
            .apply(Instruction::single_qubit_gate(StandardGate::Rz(theta), qubit))?;
        Ok(self)
    }

    /// Apply CNOT gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.dag.apply(Instruction::two_qubit_gate(
            StandardGate::CX,
            control,
            target,
        ))?;
        Ok(self)
    }

    /// Apply CZ gate.
    pub fn cz(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.dag
            .apply(Instruction::two_qubit_gate(StandardGate::CZ, q1, q2))?;
        Ok(self)
    }

    /// Apply an arbitrary gate.
    pub fn gate(
        &mut self,
        gate: impl Into<Gate>,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.dag.apply(Instruction::gate(gate, qubits))?;
        Ok(self)
    }

    // =========================================================================
    // Other operations
    // =========================================================================

    /// Measure a qubit to a classical bit.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.dag.apply(Instruction::measure(qubit, clbit))?;
        Ok(self)
    }

    /// Reset a qubit to |0⟩.
    pub fn reset(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.dag.apply(Instruction::reset(qubit))?;
        Ok(self)
    }

    /// Apply a barrier to specified qubits.
    pub fn barrier(&mut self, qubits: impl IntoIterator<Item = QubitId>) -> IrResult<&mut Self> {
        self.dag.apply(Instruction::barrier(qubits))?;
        Ok(self)
    }

    /// Apply a barrier to all qubits.
    pub fn barrier_all(&mut self) -> IrResult<&mut Self> {
        let qubits: Vec<_> = self.dag.qubits().collect();
        self.dag.apply(Instruction::barrier(qubits))?;
        Ok(self)
    }

    /// Idle a qubit for `duration` in `unit`.
    pub fn delay(&mut self, qubit: QubitId, duration: f64, unit: TimeUnit) -> IrResult<&mut Self> {
        self.dag.apply(Instruction::delay(qubit, duration, unit))?;
        Ok(self)
    }

    /// Idle a qubit for a whole number of ticks.
    pub fn delay_ticks(&mut self, qubit: QubitId, ticks: u64) -> IrResult<&mut Self> {
        self.dag.apply(Instruction::delay_ticks(qubit, ticks))?;
        Ok(self)
    }

    /// Attach a pulse calibration for a custom gate.
    pub fn add_calibration(
        &mut self,
        gate: impl Into<String>,
        qubits: impl IntoIterator<Item = QubitId>,
        schedule: PulseSchedule,
    ) -> &mut Self {
        self.dag.add_calibration(gate, qubits, schedule);
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.dag.num_qubits()
    }

    /// Get the number of classical bits.
    pub fn num_clbits(&self) -> usize {
        self.dag.num_clbits()
    }

    /// Get the circuit depth.
    pub fn depth(&self) -> usize {
        self.dag.depth()
    }

    /// Get a reference to the underlying DAG.
    pub fn dag(&self) -> &CircuitDag {
        &self.dag
    }

    /// Get a mutable reference to the underlying DAG.
    pub fn dag_mut(&mut self) -> &mut CircuitDag {
        &mut self.dag
    }

    /// Consume the circuit and return the DAG.
    pub fn into_dag(self) -> CircuitDag {
        self.dag
    }

    /// Wrap an existing DAG.
    pub fn from_dag(name: impl Into<String>, dag: CircuitDag) -> Self {
        Self {
            name: name.into(),
            dag,
        }
    }
}

/// A calibration as it appears in a serialized circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationEntry {
    /// Gate name.
    pub gate: String,
    /// Qubit tuple the schedule applies to.
    pub qubits: Vec<QubitId>,
    /// The pulse schedule.
    pub schedule: PulseSchedule,
}

/// Flat, serializable form of a circuit.
///
/// Instructions are listed in topological order; loading them back with
/// [`CircuitRecord::into_dag`] reproduces the same per-qubit sequences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitRecord {
    /// Circuit name.
    #[serde(default = "default_name")]
    pub name: String,
    /// Number of qubits; wires are `0..num_qubits`.
    pub num_qubits: u32,
    /// Number of classical bits.
    #[serde(default)]
    pub num_clbits: u32,
    /// Instructions in program order.
    #[serde(default)]
    pub instructions: Vec<Instruction>,
    /// Pulse calibrations for custom gates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calibrations: Vec<CalibrationEntry>,
}

fn default_name() -> String {
    "circuit".into()
}

impl CircuitRecord {
    /// Flatten a DAG.
    pub fn from_dag(name: impl Into<String>, dag: &CircuitDag) -> Self {
        Self {
            name: name.into(),
            num_qubits: dag.qubits().last().map_or(0, |q| q.0 + 1),
            num_clbits: dag.clbits().last().map_or(0, |c| c.0 + 1),
            instructions: dag.topological_ops().map(|(_, i)| i.clone()).collect(),
            calibrations: dag
                .calibrations()
                .map(|(key, schedule)| CalibrationEntry {
                    gate: key.gate.clone(),
                    qubits: key.qubits.clone(),
                    schedule: schedule.clone(),
                })
                .collect(),
        }
    }

    /// Rebuild the DAG, validating every instruction on the way in.
    pub fn into_dag(self) -> IrResult<CircuitDag> {
        let mut dag = CircuitDag::with_size(self.num_qubits, self.num_clbits);
        for inst in self.instructions {
            dag.apply(inst)?;
        }
        for entry in self.calibrations {
            dag.add_calibration(entry.gate, entry.qubits, entry.schedule);
        }
        Ok(dag)
    }

    /// Rebuild as a named [`Circuit`].
    pub fn into_circuit(self) -> IrResult<Circuit> {
        let name = self.name.clone();
        Ok(Circuit::from_dag(name, self.into_dag()?))
    }
}

impl From<&Circuit> for CircuitRecord {
    fn from(circuit: &Circuit) -> Self {
        CircuitRecord::from_dag(circuit.name(), circuit.dag())
    }
}
