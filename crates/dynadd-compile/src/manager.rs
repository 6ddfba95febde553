//! Pass manager and the decoupling pipeline preset.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use dynadd_ir::CircuitDag;

use crate::backend::Calibration;
use crate::dd::Sequence;
use crate::error::CompileResult;
use crate::pass::Pass;
use crate::passes::{BarriersToDelays, DelayToDd, FlagFundamentalState, MergeDelays, SchedulingMethod};
use crate::property::PropertySet;

/// Runs passes in order over a DAG.
pub struct PassManager {
    passes: Vec<Box<dyn Pass>>,
}

impl PassManager {
    /// Create a new empty pass manager.
    pub fn new() -> Self {
        Self { passes: vec![] }
    }

    /// Add a pass to the manager.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    /// Names of the passes, in run order.
    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Run all passes on the given DAG.
    ///
    /// The first failing pass aborts the run; `dag` is left as that pass
    /// received it.
    #[instrument(skip(self, dag, properties))]
    pub fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> CompileResult<()> {
        info!(
            "Running pass manager with {} passes on circuit with {} qubits, {} ops",
            self.passes.len(),
            dag.num_qubits(),
            dag.num_ops()
        );

        for pass in &self.passes {
            if pass.should_run(dag, properties) {
                debug!("Running pass: {}", pass.name());
                pass.run(dag, properties)?;
                debug!("Pass {} completed, ops: {}", pass.name(), dag.num_ops());
            } else {
                debug!("Skipping pass: {}", pass.name());
            }
        }

        info!(
            "Pass manager completed, final depth: {}, ops: {}",
            dag.depth(),
            dag.num_ops()
        );

        Ok(())
    }

    /// Get the number of passes.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Check if the manager has no passes.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for the decoupling pipeline.
///
/// The passes always run in the same order: [`BarriersToDelays`],
/// [`MergeDelays`], [`FlagFundamentalState`], [`DelayToDd`].
pub struct DdPassManagerBuilder {
    backend: Arc<dyn Calibration>,
    sequence: Sequence,
    scheduling: SchedulingMethod,
}

impl DdPassManagerBuilder {
    /// Start a pipeline inserting `sequence` on `backend`.
    pub fn new(backend: Arc<dyn Calibration>, sequence: Sequence) -> Self {
        Self {
            backend,
            sequence,
            scheduling: SchedulingMethod::default(),
        }
    }

    /// Set the scheduling direction (ALAP by default).
    #[must_use]
    pub fn with_scheduling(mut self, scheduling: SchedulingMethod) -> Self {
        self.scheduling = scheduling;
        self
    }

    /// Build the pass manager and return it with fresh properties.
    pub fn build(self) -> (PassManager, PropertySet) {
        let tick = self.backend.tick_length();
        let mut pm = PassManager::new();
        pm.add_pass(BarriersToDelays::new(self.backend, self.scheduling));
        pm.add_pass(MergeDelays::new(tick));
        pm.add_pass(FlagFundamentalState);
        pm.add_pass(DelayToDd::new(self.sequence, tick));
        (pm, PropertySet::new())
    }
}

/// Run the full decoupling pipeline on `dag`.
pub fn insert_dd(
    dag: &mut CircuitDag,
    backend: Arc<dyn Calibration>,
    sequence: Sequence,
    scheduling: SchedulingMethod,
) -> CompileResult<PropertySet> {
    let (pm, mut props) = DdPassManagerBuilder::new(backend, sequence)
        .with_scheduling(scheduling)
        .build();
    pm.run(dag, &mut props)?;
    Ok(props)
}
