//! Translation of standard gates into a backend's native basis.
//!
//! Three basis families are recognized from the basis gate names:
//! - IQM: PRX + CZ
//! - IBM: RZ + SX + X + CX
//! - IBM Heron: RZ + SX + X + CZ
//!
//! Only single-qubit gates are translated: these are the primitives that
//! make up gate-based decoupling sequences.

use std::f64::consts::PI;

use dynadd_ir::{Instruction, QubitId, StandardGate};

use crate::error::{CompileError, CompileResult};
use crate::property::BasisGates;

/// A recognized family of native gate sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasisFamily {
    /// PRX + CZ.
    Iqm,
    /// RZ + SX + X + CX.
    Ibm,
    /// RZ + SX + X + CZ.
    Heron,
}

impl BasisFamily {
    /// Detect the family of a basis, if it is one we can translate to.
    pub fn detect(basis: &BasisGates) -> Option<Self> {
        if basis.contains("prx") && basis.contains("cz") {
            Some(BasisFamily::Iqm)
        } else if basis.contains("rz") && basis.contains("sx") && basis.contains("cx") {
            Some(BasisFamily::Ibm)
        } else if basis.contains("rz") && basis.contains("sx") && basis.contains("cz") {
            Some(BasisFamily::Heron)
        } else {
            None
        }
    }
}

/// Express the single-qubit `gate` on `q` in the native gates of `basis`.
///
/// Gates already in the basis come back unchanged. An empty result means the
/// gate is the identity and needs no hardware operation. Multi-qubit gates
/// are never translated.
pub fn translate_to_basis(
    gate: &StandardGate,
    q: QubitId,
    basis: &BasisGates,
) -> CompileResult<Vec<Instruction>> {
    if gate.num_qubits() != 1 {
        return Err(CompileError::GateNotInBasis(gate.name().to_string()));
    }

    if basis.contains(gate.name()) {
        return Ok(vec![Instruction::single_qubit_gate(gate.clone(), q)]);
    }

    let translated = match BasisFamily::detect(basis) {
        Some(BasisFamily::Iqm) => translate_to_iqm(gate, q),
        Some(BasisFamily::Ibm | BasisFamily::Heron) => translate_rz_sx(gate, q),
        None => None,
    };
    translated.ok_or_else(|| CompileError::GateNotInBasis(gate.name().to_string()))
}

fn rz(theta: f64, q: QubitId) -> Instruction {
    Instruction::single_qubit_gate(StandardGate::Rz(theta), q)
}

fn sx(q: QubitId) -> Instruction {
    Instruction::single_qubit_gate(StandardGate::SX, q)
}

fn prx(theta: f64, phi: f64, q: QubitId) -> Instruction {
    Instruction::single_qubit_gate(StandardGate::PRX(theta, phi), q)
}

/// RZ + SX + X, shared by the IBM and Heron bases.
fn translate_rz_sx(gate: &StandardGate, q: QubitId) -> Option<Vec<Instruction>> {
    Some(match gate {
        StandardGate::I => vec![],
        StandardGate::X => vec![Instruction::single_qubit_gate(StandardGate::X, q)],

        // Y = Rz(π) · X
        StandardGate::Y => vec![
            rz(PI, q),
            Instruction::single_qubit_gate(StandardGate::X, q),
        ],

        StandardGate::Z => vec![rz(PI, q)],
        StandardGate::S => vec![rz(PI / 2.0, q)],
        StandardGate::Sdg => vec![rz(-PI / 2.0, q)],
        StandardGate::T => vec![rz(PI / 4.0, q)],
        StandardGate::Tdg => vec![rz(-PI / 4.0, q)],
        StandardGate::P(theta) | StandardGate::Rz(theta) => vec![rz(*theta, q)],

        // H = Rz(π/2) · SX · Rz(π/2)
        StandardGate::H => vec![rz(PI / 2.0, q), sx(q), rz(PI / 2.0, q)],

        StandardGate::SX => vec![sx(q)],

        // SX† = Z · SX · Z
        StandardGate::SXdg => vec![rz(PI, q), sx(q), rz(PI, q)],

        // Rx(θ) = H · Rz(θ) · H with the inner Rz merged
        StandardGate::Rx(theta) => vec![
            rz(PI / 2.0, q),
            sx(q),
            rz(theta + PI, q),
            sx(q),
            rz(PI / 2.0, q),
        ],

        // Ry(θ) = S · Rx(θ) · S†
        StandardGate::Ry(theta) => vec![sx(q), rz(theta + PI, q), sx(q), rz(PI, q)],

        // PRX(θ, φ) = Rz(φ) · Rx(θ) · Rz(-φ)
        StandardGate::PRX(theta, phi) => vec![
            rz(PI / 2.0 - phi, q),
            sx(q),
            rz(theta + PI, q),
            sx(q),
            rz(PI / 2.0 + phi, q),
        ],

        StandardGate::CX | StandardGate::CZ | StandardGate::ECR | StandardGate::Swap => {
            return None;
        }
    })
}

/// PRX, the single-qubit half of the IQM basis.
fn translate_to_iqm(gate: &StandardGate, q0: QubitId) -> Option<Vec<Instruction>> {
    Some(match gate {
        StandardGate::I => vec![],

        // X = PRX(π, 0)
        StandardGate::X => vec![prx(PI, 0.0, q0)],

        // Y = PRX(π, π/2)
        StandardGate::Y => vec![prx(PI, PI / 2.0, q0)],

        // Z = PRX(π, π/2) · PRX(π, 0) up to global phase
        StandardGate::Z => vec![prx(PI, PI / 2.0, q0), prx(PI, 0.0, q0)],

        // H = PRX(π, 0) · PRX(π/2, π/2) up to global phase
        StandardGate::H => vec![prx(PI / 2.0, PI / 2.0, q0), prx(PI, 0.0, q0)],

        StandardGate::SX => vec![prx(PI / 2.0, 0.0, q0)],
        StandardGate::SXdg => vec![prx(-PI / 2.0, 0.0, q0)],
        StandardGate::Rx(theta) => vec![prx(*theta, 0.0, q0)],
        StandardGate::Ry(theta) => vec![prx(*theta, PI / 2.0, q0)],

        // Rz(θ) = PRX(π, θ/2) · PRX(π, 0)
        StandardGate::Rz(theta) | StandardGate::P(theta) => {
            vec![prx(PI, theta / 2.0, q0), prx(PI, 0.0, q0)]
        }
        StandardGate::S => vec![prx(PI, PI / 4.0, q0), prx(PI, 0.0, q0)],
        StandardGate::Sdg => vec![prx(PI, -PI / 4.0, q0), prx(PI, 0.0, q0)],
        StandardGate::T => vec![prx(PI, PI / 8.0, q0), prx(PI, 0.0, q0)],
        StandardGate::Tdg => vec![prx(PI, -PI / 8.0, q0), prx(PI, 0.0, q0)],

        StandardGate::PRX(theta, phi) => vec![prx(*theta, *phi, q0)],

        StandardGate::CX | StandardGate::CZ | StandardGate::ECR | StandardGate::Swap => {
            return None;
        }
    })
}
