//! Error types for the compilation crate.

use dynadd_ir::TimeUnit;
use thiserror::Error;

/// Errors that can occur while building or running the decoupling pipeline.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Error from the IR crate.
    #[error("IR error: {0}")]
    Ir(#[from] dynadd_ir::IrError),

    /// A conversion needed a value that was not supplied.
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    /// `scale_to` called on a component with a hardware-fixed duration.
    #[error("Component '{0}' has a fixed duration and cannot be scaled")]
    ComponentNotScalable(String),

    /// Unknown single-qubit primitive.
    #[error("Gate '{0}' is not a known single-qubit gate")]
    GateNotFound(String),

    /// A calibrated duration does not fall on the tick grid.
    #[error("Duration {time} {unit} is {ticks} ticks, not a whole number of ticks")]
    TimingAlignment {
        time: f64,
        unit: TimeUnit,
        ticks: f64,
    },

    /// The backend has no calibrated length for a gate on these qubits.
    #[error("No calibrated length for gate '{gate}' on qubits {qubits:?}")]
    MissingGateLength { gate: String, qubits: Vec<u32> },

    /// The backend has no pulse schedule for a gate on these qubits.
    #[error("No pulse schedule for '{gate}' on qubits {qubits:?}")]
    MissingPulseSchedule { gate: String, qubits: Vec<u32> },

    /// Gate not in target basis.
    #[error("Gate '{0}' not in target basis")]
    GateNotInBasis(String),

    /// A sequence was constructed inconsistently.
    #[error("Invalid sequence: {0}")]
    InvalidSequence(String),

    /// A sequence was built into a window no longer than its fixed part.
    #[error("Window of {window} ticks does not exceed the {fixed} fixed ticks of sequence '{sequence}'")]
    WindowTooShort {
        sequence: String,
        window: u64,
        fixed: u64,
    },

    /// A scheme or scheduling name was not recognized.
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// Backend description is inconsistent.
    #[error("Invalid backend: {0}")]
    InvalidBackend(String),

    /// Backend description could not be parsed.
    #[error("Failed to parse backend {format}: {message}")]
    BackendParse {
        format: &'static str,
        message: String,
    },

    /// Backend file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_yaml_ng::Error> for CompileError {
    fn from(e: serde_yaml_ng::Error) -> Self {
        CompileError::BackendParse {
            format: "YAML",
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for CompileError {
    fn from(e: serde_json::Error) -> Self {
        CompileError::BackendParse {
            format: "JSON",
            message: e.to_string(),
        }
    }
}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;
