//! Ground-state analysis.

use rustc_hash::FxHashMap;
use tracing::debug;

use dynadd_ir::{CircuitDag, Instruction, QubitId};

use crate::error::CompileResult;
use crate::pass::{Pass, PassKind};
use crate::property::{FundamentalStateMap, PropertySet};

/// Flag every operation that acts while all of its qubits are still in |0⟩.
///
/// Identity gates, delays, barriers and resets leave the state alone and are
/// flagged with the pre-node state of their qubits; a reset then returns its
/// qubits to the ground state. Anything else is flagged `false` and marks its
/// qubits as excited.
///
/// The result lands in [`PropertySet::fundamental_state`].
pub struct FlagFundamentalState;

impl FlagFundamentalState {
    /// Compute the flags for `dag`.
    pub fn analyze(dag: &CircuitDag) -> FundamentalStateMap {
        let mut ground: FxHashMap<QubitId, bool> = dag.qubits().map(|q| (q, true)).collect();
        let mut flags = FundamentalStateMap::new();

        for (node, inst) in dag.topological_ops() {
            if leaves_state_alone(inst) {
                let flag = inst
                    .qubits
                    .iter()
                    .all(|q| ground.get(q).copied().unwrap_or(true));
                flags.insert(node, flag);
                if inst.is_reset() {
                    for q in &inst.qubits {
                        ground.insert(*q, true);
                    }
                }
            } else {
                flags.insert(node, false);
                for q in &inst.qubits {
                    ground.insert(*q, false);
                }
            }
        }
        flags
    }
}

fn leaves_state_alone(inst: &Instruction) -> bool {
    inst.is_identity() || inst.is_delay() || inst.is_barrier() || inst.is_reset()
}

impl Pass for FlagFundamentalState {
    fn name(&self) -> &'static str {
        "FlagFundamentalState"
    }

    fn kind(&self) -> PassKind {
        PassKind::Analysis
    }

    fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> CompileResult<()> {
        let flags = Self::analyze(dag);
        debug!(
            "{} of {} ops act on the ground state",
            flags.ground_count(),
            flags.len()
        );
        properties.fundamental_state = Some(flags);
        Ok(())
    }
}
