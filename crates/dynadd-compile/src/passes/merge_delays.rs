//! Collapse consecutive delays on a qubit into a single delay.

use rustc_hash::FxHashMap;
use tracing::trace;

use dynadd_ir::{CircuitDag, Instruction, QubitId};

use crate::error::CompileResult;
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;
use crate::time::{DEFAULT_ALIGNMENT_TOLERANCE, to_ticks_float};

/// Merge every run of delays on a qubit into one delay in ticks.
///
/// Delays are held back until the next non-delay operation on the same
/// qubit, then emitted as a single delay right before it. Whatever is still
/// pending at the end of the circuit is flushed last.
///
/// Accumulated lengths within [`DEFAULT_ALIGNMENT_TOLERANCE`] of a whole
/// tick count snap to it; otherwise the fraction is dropped. Gaps shorter
/// than one tick vanish.
pub struct MergeDelays {
    tick_length: f64,
}

impl MergeDelays {
    /// Create the pass for a backend with the given tick length in seconds.
    pub fn new(tick_length: f64) -> Self {
        Self { tick_length }
    }

    /// Build the merged copy of `dag`.
    pub fn rewrite(&self, dag: &CircuitDag) -> CompileResult<CircuitDag> {
        let mut out = dag.copy_empty_like();
        let mut pending: FxHashMap<QubitId, f64> = FxHashMap::default();

        for (_, inst) in dag.topological_ops() {
            if let Some((duration, unit)) = inst.delay_duration() {
                let ticks = to_ticks_float(duration, unit, self.tick_length);
                for q in &inst.qubits {
                    *pending.entry(*q).or_insert(0.0) += ticks;
                }
                continue;
            }
            for q in &inst.qubits {
                if let Some(acc) = pending.remove(q) {
                    flush(&mut out, *q, acc)?;
                }
            }
            out.apply(inst.clone())?;
        }

        let mut rest: Vec<(QubitId, f64)> = pending.into_iter().collect();
        rest.sort_unstable_by_key(|(q, _)| *q);
        for (q, acc) in rest {
            flush(&mut out, q, acc)?;
        }
        Ok(out)
    }
}

/// Whole ticks in an accumulated gap.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn whole_ticks(acc: f64) -> u64 {
    let nearest = acc.round();
    if (acc - nearest).abs() <= DEFAULT_ALIGNMENT_TOLERANCE {
        nearest as u64
    } else {
        acc.floor() as u64
    }
}

fn flush(out: &mut CircuitDag, qubit: QubitId, acc: f64) -> CompileResult<()> {
    let ticks = whole_ticks(acc);
    if ticks == 0 {
        trace!("dropping sub-tick gap of {} on {}", acc, qubit);
        return Ok(());
    }
    out.apply(Instruction::delay_ticks(qubit, ticks))?;
    Ok(())
}

impl Pass for MergeDelays {
    fn name(&self) -> &'static str {
        "MergeDelays"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, dag: &mut CircuitDag, _properties: &mut PropertySet) -> CompileResult<()> {
        *dag = self.rewrite(dag)?;
        Ok(())
    }

    fn should_run(&self, dag: &CircuitDag, _properties: &PropertySet) -> bool {
        // Nothing to merge in a fully packed circuit
        dag.topological_ops().any(|(_, inst)| inst.is_delay())
    }
}
