//! Replace idle windows by dynamical-decoupling sequences.

use tracing::{debug, trace};

use dynadd_ir::CircuitDag;

use crate::dd::Sequence;
use crate::error::CompileResult;
use crate::pass::{Pass, PassKind};
use crate::property::{DdInsertionReport, FundamentalStateMap, PropertySet};
use crate::time::to_ticks_rounded;

/// Splice a decoupling sequence into every delay it fits in.
///
/// A delay of `d` ticks on qubits `Q` is replaced by the sequence built for
/// exactly `d` ticks on `Q` when the sequence's fixed part is strictly
/// shorter than `d`. Shorter delays and all other operations are copied
/// unchanged. Pulse calibrations of the spliced fragments are carried over.
///
/// Ground-state flags from [`FlagFundamentalState`](super::FlagFundamentalState)
/// are moved to the rewritten nodes: every node spliced in for a delay
/// inherits that delay's flag. A [`DdInsertionReport`] is stored.
pub struct DelayToDd {
    sequence: Sequence,
    tick_length: f64,
}

struct Spliced {
    dag: CircuitDag,
    report: DdInsertionReport,
    flags: Option<FundamentalStateMap>,
}

impl DelayToDd {
    /// Create the pass for `sequence` on a backend with the given tick length.
    pub fn new(sequence: Sequence, tick_length: f64) -> Self {
        Self {
            sequence,
            tick_length,
        }
    }

    /// The sequence being inserted.
    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    /// Build the rewritten copy of `dag`.
    pub fn rewrite(&self, dag: &CircuitDag) -> CompileResult<CircuitDag> {
        Ok(self.splice(dag, None)?.dag)
    }

    fn splice(
        &self,
        dag: &CircuitDag,
        flags: Option<&FundamentalStateMap>,
    ) -> CompileResult<Spliced> {
        let mut out = dag.copy_empty_like();
        let mut report = DdInsertionReport::default();
        let mut moved = flags.map(|_| FundamentalStateMap::new());

        for (node, inst) in dag.topological_ops() {
            let flag = flags.and_then(|f| f.get(node));

            if let Some((duration, unit)) = inst.delay_duration() {
                report.delays_seen += 1;
                if flag == Some(true) {
                    report.ground_state_delays += 1;
                }

                let ticks = to_ticks_rounded(duration, unit, self.tick_length);
                let hardware = inst.qubit_indices();
                if self.sequence.can_be_used(ticks, &hardware)? {
                    let fragment = self.sequence.build(ticks, &hardware)?;
                    let added = out.compose(&fragment, &inst.qubits)?;
                    if let (Some(moved), Some(flag)) = (moved.as_mut(), flag) {
                        for new_node in added {
                            moved.insert(new_node, flag);
                        }
                    }
                    report.delays_replaced += 1;
                    report.ticks_covered += ticks;
                    debug!(
                        "Replaced {}-tick delay on {:?} with {} ({} ops)",
                        ticks,
                        inst.qubits,
                        self.sequence.name(),
                        fragment.num_ops()
                    );
                    continue;
                }
                trace!("{}-tick delay on {:?} too short, kept", ticks, inst.qubits);
            }

            let new_node = out.apply(inst.clone())?;
            if let (Some(moved), Some(flag)) = (moved.as_mut(), flag) {
                moved.insert(new_node, flag);
            }
        }

        Ok(Spliced {
            dag: out,
            report,
            flags: moved,
        })
    }
}

impl Pass for DelayToDd {
    fn name(&self) -> &'static str {
        "DelayToDd"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> CompileResult<()> {
        let spliced = self.splice(dag, properties.fundamental_state.as_ref())?;
        debug!(
            "{}: replaced {} of {} delays, {} ticks covered",
            self.sequence.name(),
            spliced.report.delays_replaced,
            spliced.report.delays_seen,
            spliced.report.ticks_covered
        );
        *dag = spliced.dag;
        if spliced.flags.is_some() {
            properties.fundamental_state = spliced.flags;
        }
        properties.insert(spliced.report);
        Ok(())
    }
}
