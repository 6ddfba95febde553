//! Dynadd Decoupling Compiler
//!
//! This crate inserts dynamical-decoupling (DD) sequences into the idle
//! windows of a quantum circuit. It follows the pass-based layout of a
//! classic transpiler: each stage is a [`Pass`] over a
//! [`CircuitDag`](dynadd_ir::CircuitDag), driven by a [`PassManager`] and
//! sharing results through a [`PropertySet`].
//!
//! # Pipeline
//!
//! ```text
//! Input Circuit
//!       |
//!       v
//! BarriersToDelays      schedule against gate lengths, make idle time explicit
//!       |
//! MergeDelays           one delay per gap, in whole ticks
//!       |
//! FlagFundamentalState  which ops act on qubits still in |0>
//!       |
//! DelayToDd             splice the sequence into every window it fits
//!       |
//!       v
//! Output Circuit (+ pulse calibrations)
//! ```
//!
//! Hardware data comes from a [`Calibration`] implementation, usually a
//! [`BackendProperties`] loaded from YAML or JSON.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use dynadd_compile::{
//!     BackendProperties, BasisGates, Calibration, Scheme, SchemeOptions, SchedulingMethod,
//!     build_scheme, insert_dd,
//! };
//! use dynadd_ir::{Circuit, QubitId};
//!
//! let backend: Arc<dyn Calibration> = Arc::new(
//!     BackendProperties::new("toy", 2, 1e-9, BasisGates::ibm())
//!         .with_uniform_gate_length("x", 40e-9)
//!         .with_gate_length("cx", [0, 1], 160e-9),
//! );
//!
//! let mut circuit = Circuit::with_size("demo", 2, 0);
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! for _ in 0..4 {
//!     circuit.x(QubitId(0)).unwrap();
//! }
//!
//! let sequence = build_scheme(Scheme::CarrPurcell, &SchemeOptions::default(), backend.clone())?;
//! let mut dag = circuit.into_dag();
//! let props = insert_dd(&mut dag, backend, sequence, SchedulingMethod::Alap)?;
//!
//! assert_eq!(props.dd_report().map(|r| r.delays_replaced), Some(1));
//! # Ok::<(), dynadd_compile::CompileError>(())
//! ```
//!
//! # Schemes
//!
//! | Scheme | Pulses |
//! |--------|--------|
//! | `cp` | X |
//! | `cpmg`, `cpmg-pulse` | Y |
//! | `xy4`, `xy4-pulse` | X Y X Y |
//! | `kdd` | XY-4 of five-pulse composite rotations |
//! | `uhrig`, `uhrig-pulse` | Y at sin² spaced instants |
//! | `hahn` | one Y |

pub mod backend;
pub mod dd;
pub mod error;
pub mod manager;
pub mod pass;
pub mod property;
pub mod time;
pub mod translation;

// Built-in passes
pub mod passes;

pub use backend::{BackendProperties, Calibration, GateLength, PulseCalibration};
pub use dd::{Component, Scheme, SchemeOptions, Sequence, build_scheme};
pub use error::{CompileError, CompileResult};
pub use manager::{DdPassManagerBuilder, PassManager, insert_dd};
pub use pass::{Pass, PassKind};
pub use passes::{BarriersToDelays, DelayToDd, FlagFundamentalState, MergeDelays, SchedulingMethod};
pub use property::{BasisGates, DdInsertionReport, FundamentalStateMap, PropertySet};
