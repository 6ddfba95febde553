//! Dynadd Timed Circuit Intermediate Representation
//!
//! This crate provides the circuit data structures the dynamical-decoupling
//! pipeline rewrites: a wire-ordered DAG whose operations include explicit
//! idle periods, plus the pulse schedules that calibrate custom gates.
//!
//! # Core Components
//!
//! - **Qubits and Classical Bits**: [`QubitId`], [`ClbitId`]
//! - **Gates**: [`StandardGate`] for built-in gates and [`CustomGate`] for
//!   calibrated, backend-specific operations
//! - **Instructions**: [`Instruction`], including [`InstructionKind::Delay`]
//!   carrying a duration and a [`TimeUnit`]
//! - **Pulses**: [`PulseSchedule`] attached to the DAG as calibrations
//! - **DAG**: [`CircuitDag`] with deterministic topological order
//! - **Circuit**: [`Circuit`] builder and the serializable [`CircuitRecord`]
//!
//! # Example: An Idle Window
//!
//! ```rust
//! use dynadd_ir::{Circuit, QubitId, TimeUnit};
//!
//! let mut circuit = Circuit::with_size("idle", 2, 0);
//! circuit.x(QubitId(0)).unwrap();
//! circuit.delay(QubitId(1), 320.0, TimeUnit::Dt).unwrap();
//! circuit.barrier_all().unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.dag().num_ops(), 3);
//! ```

pub mod circuit;
pub mod dag;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod pulse;
pub mod qubit;
pub mod time;

pub use circuit::{CalibrationEntry, Circuit, CircuitRecord};
pub use dag::{CalibrationKey, CircuitDag, DagEdge, DagNode, NodeIndex, WireId};
pub use error::{IrError, IrResult};
pub use gate::{CustomGate, Gate, GateKind, StandardGate};
pub use instruction::{Instruction, InstructionKind};
pub use pulse::{PulseOp, PulseSchedule};
pub use qubit::{ClbitId, QubitId};
pub use time::TimeUnit;
