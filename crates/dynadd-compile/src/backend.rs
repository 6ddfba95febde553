//! Backend calibration data.
//!
//! The decoupling pipeline never talks to hardware. Everything it needs to
//! know about a device (tick length, calibrated gate lengths, the native
//! basis and pulse schedules) comes through the [`Calibration`] trait, which
//! is injected once when the pipeline is built.
//!
//! [`BackendProperties`] is the file-backed implementation:
//!
//! ```yaml
//! name: fake_lima
//! num_qubits: 2
//! dt: 2.2222222222222221e-10
//! basis_gates: [id, rz, sx, x, cx, measure, reset, barrier, delay]
//! gate_lengths:
//!   - { gate: x, qubits: [0], length: 3.5555555555555554e-08 }
//!   - { gate: cx, qubits: [0, 1], length: 2.8444444444444443e-07 }
//! pulse_calibrations:
//!   - gate: x
//!     qubits: [0]
//!     schedule: { name: x, ops: [{ op: play, waveform: drag_x0, duration: 160 }] }
//! ```

use std::fmt;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use dynadd_ir::{Instruction, PulseSchedule, QubitId, StandardGate};

use crate::error::{CompileError, CompileResult};
use crate::property::BasisGates;
use crate::translation::translate_to_basis;

/// Device data the decoupling pipeline depends on.
///
/// Qubit tuples are hardware indices in operand order.
pub trait Calibration: Send + Sync + fmt::Debug {
    /// Backend name, for logs.
    fn name(&self) -> &str;

    /// Number of hardware qubits.
    fn num_qubits(&self) -> u32;

    /// Length of one tick (`dt`) in seconds.
    fn tick_length(&self) -> f64;

    /// Calibrated length of `gate` on `qubits`, in seconds.
    fn gate_length(&self, gate: &str, qubits: &[u32]) -> CompileResult<f64>;

    /// Translate a single-qubit standard gate into the native basis.
    ///
    /// The result acts on local qubit 0.
    fn translate_to_basis(&self, gate: &StandardGate) -> CompileResult<Vec<Instruction>>;

    /// Pulse schedule of `gate` on `qubits`, if calibrated.
    fn pulse_schedule(&self, gate: &str, qubits: &[u32]) -> Option<&PulseSchedule>;
}

/// A calibrated gate length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateLength {
    /// Gate name.
    pub gate: String,
    /// Hardware qubits.
    pub qubits: Vec<u32>,
    /// Length in seconds.
    pub length: f64,
}

/// A calibrated pulse schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulseCalibration {
    /// Gate name.
    pub gate: String,
    /// Hardware qubits.
    pub qubits: Vec<u32>,
    /// The schedule.
    pub schedule: PulseSchedule,
}

type CalKey = (String, Vec<u32>);

/// Backend properties loaded from YAML or JSON.
///
/// ## Deserialization
///
/// After deserializing by hand, call [`rebuild_caches()`](Self::rebuild_caches)
/// to build the lookup indices (skipped during serialization). Without it,
/// lookups fall back to a linear scan. The `from_*` constructors and
/// [`load`](Self::load) do this for you.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendProperties {
    /// Backend name.
    pub name: String,
    /// Number of hardware qubits.
    pub num_qubits: u32,
    /// Tick length in seconds.
    pub dt: f64,
    /// Native gate names.
    pub basis_gates: BasisGates,
    /// Calibrated gate lengths.
    #[serde(default)]
    gate_lengths: Vec<GateLength>,
    /// Calibrated pulse schedules.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pulse_calibrations: Vec<PulseCalibration>,
    #[serde(skip)]
    length_index: FxHashMap<CalKey, f64>,
    #[serde(skip)]
    pulse_index: FxHashMap<CalKey, usize>,
}

impl BackendProperties {
    /// Create a backend with no calibrations.
    pub fn new(name: impl Into<String>, num_qubits: u32, dt: f64, basis_gates: BasisGates) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            dt,
            basis_gates,
            gate_lengths: vec![],
            pulse_calibrations: vec![],
            length_index: FxHashMap::default(),
            pulse_index: FxHashMap::default(),
        }
    }

    /// Add a calibrated gate length in seconds.
    #[must_use]
    pub fn with_gate_length(
        mut self,
        gate: impl Into<String>,
        qubits: impl IntoIterator<Item = u32>,
        length: f64,
    ) -> Self {
        let entry = GateLength {
            gate: gate.into(),
            qubits: qubits.into_iter().collect(),
            length,
        };
        self.length_index
            .insert((entry.gate.clone(), entry.qubits.clone()), length);
        self.gate_lengths.push(entry);
        self
    }

    /// Give a single-qubit gate the same length on every qubit.
    #[must_use]
    pub fn with_uniform_gate_length(mut self, gate: &str, length: f64) -> Self {
        for q in 0..self.num_qubits {
            self = self.with_gate_length(gate, [q], length);
        }
        self
    }

    /// Add a calibrated pulse schedule.
    #[must_use]
    pub fn with_pulse_calibration(
        mut self,
        gate: impl Into<String>,
        qubits: impl IntoIterator<Item = u32>,
        schedule: PulseSchedule,
    ) -> Self {
        let entry = PulseCalibration {
            gate: gate.into(),
            qubits: qubits.into_iter().collect(),
            schedule,
        };
        self.pulse_index.insert(
            (entry.gate.clone(), entry.qubits.clone()),
            self.pulse_calibrations.len(),
        );
        self.pulse_calibrations.push(entry);
        self
    }

    /// Parse from a YAML document.
    pub fn from_yaml_str(s: &str) -> CompileResult<Self> {
        let mut backend: Self = serde_yaml_ng::from_str(s)?;
        backend.validate()?;
        backend.rebuild_caches();
        Ok(backend)
    }

    /// Parse from a JSON document.
    pub fn from_json_str(s: &str) -> CompileResult<Self> {
        let mut backend: Self = serde_json::from_str(s)?;
        backend.validate()?;
        backend.rebuild_caches();
        Ok(backend)
    }

    /// Load from a file; `.json` is parsed as JSON, anything else as YAML.
    pub fn load(path: &Path) -> CompileResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let backend = if is_json {
            Self::from_json_str(&content)?
        } else {
            Self::from_yaml_str(&content)?
        };
        debug!(
            "Loaded backend '{}' from {}: {} qubits, {} gate lengths, {} pulse calibrations",
            backend.name,
            path.display(),
            backend.num_qubits,
            backend.gate_lengths.len(),
            backend.pulse_calibrations.len()
        );
        Ok(backend)
    }

    /// Rebuild the lookup indices from the calibration lists.
    pub fn rebuild_caches(&mut self) {
        self.length_index = self
            .gate_lengths
            .iter()
            .map(|g| ((g.gate.clone(), g.qubits.clone()), g.length))
            .collect();
        self.pulse_index = self
            .pulse_calibrations
            .iter()
            .enumerate()
            .map(|(i, p)| ((p.gate.clone(), p.qubits.clone()), i))
            .collect();
    }

    /// Check the description for internal consistency.
    pub fn validate(&self) -> CompileResult<()> {
        if self.num_qubits == 0 {
            return Err(CompileError::InvalidBackend(format!(
                "backend '{}' has no qubits",
                self.name
            )));
        }
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(CompileError::InvalidBackend(format!(
                "dt must be a positive number of seconds, got {}",
                self.dt
            )));
        }

        let check_qubits = |gate: &str, qubits: &[u32]| -> CompileResult<()> {
            if qubits.is_empty() {
                return Err(CompileError::InvalidBackend(format!(
                    "calibration for '{gate}' lists no qubits"
                )));
            }
            if let Some(q) = qubits.iter().find(|&&q| q >= self.num_qubits) {
                return Err(CompileError::InvalidBackend(format!(
                    "calibration for '{gate}' uses qubit {q} but the backend has {} qubits",
                    self.num_qubits
                )));
            }
            Ok(())
        };

        for g in &self.gate_lengths {
            check_qubits(&g.gate, &g.qubits)?;
            if !g.length.is_finite() || g.length < 0.0 {
                return Err(CompileError::InvalidBackend(format!(
                    "gate '{}' on {:?} has invalid length {}",
                    g.gate, g.qubits, g.length
                )));
            }
        }
        for p in &self.pulse_calibrations {
            check_qubits(&p.gate, &p.qubits)?;
        }
        Ok(())
    }

    /// All calibrated gate lengths.
    pub fn gate_lengths(&self) -> &[GateLength] {
        &self.gate_lengths
    }

    /// All calibrated pulse schedules.
    pub fn pulse_calibrations(&self) -> &[PulseCalibration] {
        &self.pulse_calibrations
    }
}

impl Calibration for BackendProperties {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    fn tick_length(&self) -> f64 {
        self.dt
    }

    fn gate_length(&self, gate: &str, qubits: &[u32]) -> CompileResult<f64> {
        let found = if self.length_index.is_empty() {
            self.gate_lengths
                .iter()
                .find(|g| g.gate == gate && g.qubits == qubits)
                .map(|g| g.length)
        } else {
            self.length_index
                .get(&(gate.to_string(), qubits.to_vec()))
                .copied()
        };
        found.ok_or_else(|| CompileError::MissingGateLength {
            gate: gate.to_string(),
            qubits: qubits.to_vec(),
        })
    }

    fn translate_to_basis(&self, gate: &StandardGate) -> CompileResult<Vec<Instruction>> {
        translate_to_basis(gate, QubitId(0), &self.basis_gates)
    }

    fn pulse_schedule(&self, gate: &str, qubits: &[u32]) -> Option<&PulseSchedule> {
        if self.pulse_index.is_empty() {
            return self
                .pulse_calibrations
                .iter()
                .find(|p| p.gate == gate && p.qubits == qubits)
                .map(|p| &p.schedule);
        }
        self.pulse_index
            .get(&(gate.to_string(), qubits.to_vec()))
            .map(|&i| &self.pulse_calibrations[i].schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const YAML: &str = r"
name: fake_duo
num_qubits: 2
dt: 1.0e-9
basis_gates: [id, rz, sx, x, cx, measure, reset, barrier, delay]
gate_lengths:
  - { gate: x, qubits: [0], length: 4.0e-8 }
  - { gate: x, qubits: [1], length: 4.0e-8 }
  - { gate: cx, qubits: [0, 1], length: 3.0e-7 }
pulse_calibrations:
  - gate: x
    qubits: [1]
    schedule:
      name: x
      ops:
        - { op: play, waveform: drag_x1, duration: 40 }
";

    fn write_temp(content: &str, suffix: &str) -> NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn test_parse_yaml() {
        let backend = BackendProperties::from_yaml_str(YAML).unwrap();
        assert_eq!(backend.name(), "fake_duo");
        assert_eq!(backend.num_qubits(), 2);
        assert!((backend.gate_length("cx", &[0, 1]).unwrap() - 3.0e-7).abs() < 1e-20);
        assert_eq!(backend.pulse_schedule("x", &[1]).unwrap().duration(), 40);
        assert!(backend.pulse_schedule("x", &[0]).is_none());
    }

    #[test]
    fn test_missing_gate_length() {
        let backend = BackendProperties::from_yaml_str(YAML).unwrap();
        let err = backend.gate_length("cx", &[1, 0]).unwrap_err();
        assert!(matches!(err, CompileError::MissingGateLength { .. }));
    }

    #[test]
    fn test_load_json_by_extension() {
        let backend = BackendProperties::from_yaml_str(YAML).unwrap();
        let json = serde_json::to_string(&backend).unwrap();
        let f = write_temp(&json, ".json");

        let loaded = BackendProperties::load(f.path()).unwrap();
        assert_eq!(loaded.gate_lengths().len(), 3);
        assert!(loaded.gate_length("x", &[1]).is_ok());
    }

    #[test]
    fn test_load_yaml_file() {
        let f = write_temp(YAML, ".yaml");
        let loaded = BackendProperties::load(f.path()).unwrap();
        assert_eq!(loaded.pulse_calibrations().len(), 1);
    }

    #[test]
    fn test_malformed_yaml() {
        let err = BackendProperties::from_yaml_str("name: [unclosed").unwrap_err();
        assert!(matches!(err, CompileError::BackendParse { format: "YAML", .. }));
    }

    #[test]
    fn test_qubit_out_of_range_rejected() {
        let yaml = YAML.replace("qubits: [0, 1]", "qubits: [0, 5]");
        let err = BackendProperties::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, CompileError::InvalidBackend(_)));
    }

    #[test]
    fn test_unindexed_lookup_falls_back() {
        let backend: BackendProperties = serde_yaml_ng::from_str(YAML).unwrap();
        assert!(backend.gate_length("x", &[0]).is_ok());
        assert!(backend.pulse_schedule("x", &[1]).is_some());
    }

    #[test]
    fn test_translate_on_local_qubits() {
        let backend = BackendProperties::new("b", 5, 1e-9, BasisGates::ibm());
        let h = backend.translate_to_basis(&StandardGate::H).unwrap();
        assert_eq!(h.len(), 3);
        assert!(h.iter().all(|i| i.qubits == vec![QubitId(0)]));
    }

    #[test]
    fn test_uniform_gate_length() {
        let backend = BackendProperties::new("b", 3, 1e-9, BasisGates::ibm())
            .with_uniform_gate_length("sx", 2e-8);
        assert!(backend.gate_length("sx", &[2]).is_ok());
        assert!(backend.gate_length("sx", &[3]).is_err());
    }
}
