//! DAG-based circuit representation.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex as PetNodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::instruction::{Instruction, InstructionKind};
use crate::pulse::PulseSchedule;
use crate::qubit::{ClbitId, QubitId};

/// Node index type for the circuit DAG.
pub type NodeIndex = PetNodeIndex<u32>;

/// A node in the circuit DAG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DagNode {
    /// Input node for a wire.
    In(WireId),
    /// Output node for a wire.
    Out(WireId),
    /// Operation node containing an instruction.
    Op(Instruction),
}

impl DagNode {
    /// Check if this is an operation node.
    #[inline]
    pub fn is_op(&self) -> bool {
        matches!(self, DagNode::Op(_))
    }

    /// Get the instruction if this is an operation node.
    #[inline]
    pub fn instruction(&self) -> Option<&Instruction> {
        match self {
            DagNode::Op(inst) => Some(inst),
            _ => None,
        }
    }
}

/// Identifier for a wire in the DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireId {
    /// A quantum wire.
    Qubit(QubitId),
    /// A classical wire.
    Clbit(ClbitId),
}

/// An edge in the circuit DAG representing a wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DagEdge {
    /// The wire this edge represents.
    pub wire: WireId,
}

/// Key of a pulse calibration: gate name plus the exact qubit tuple.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CalibrationKey {
    /// Gate name the calibration realizes.
    pub gate: String,
    /// Qubits, in operand order.
    pub qubits: Vec<QubitId>,
}

impl CalibrationKey {
    /// Create a new key.
    pub fn new(gate: impl Into<String>, qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            gate: gate.into(),
            qubits: qubits.into_iter().collect(),
        }
    }
}

/// DAG-based circuit representation.
///
/// The circuit is represented as a directed acyclic graph where:
/// - Nodes are either input nodes, output nodes, or operation nodes
/// - Edges represent wires (quantum or classical)
/// - Each wire has exactly one input and one output node
/// - Restricted to one qubit, the operations form a total order
///
/// Pulse calibrations for custom gates travel with the graph, keyed by
/// gate name and qubit tuple.
///
/// ## Determinism
///
/// [`topological_ops`](Self::topological_ops) breaks ties by node index, so
/// a graph built by successive [`apply`](Self::apply) calls is always walked
/// in insertion order. Every rewrite in the pipeline relies on this.
#[derive(Debug, Clone, Default)]
pub struct CircuitDag {
    /// The underlying graph.
    graph: DiGraph<DagNode, DagEdge, u32>,
    /// Map from qubit to its input node.
    qubit_inputs: FxHashMap<QubitId, NodeIndex>,
    /// Map from qubit to its output node.
    qubit_outputs: FxHashMap<QubitId, NodeIndex>,
    /// Map from classical bit to its input node.
    clbit_inputs: FxHashMap<ClbitId, NodeIndex>,
    /// Map from classical bit to its output node.
    clbit_outputs: FxHashMap<ClbitId, NodeIndex>,
    /// Wire front: maps each wire to the node just before the output node.
    wire_front: FxHashMap<WireId, NodeIndex>,
    /// Pulse calibrations attached to custom gates.
    calibrations: BTreeMap<CalibrationKey, PulseSchedule>,
}

impl CircuitDag {
    /// Create a new empty circuit DAG.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a DAG with qubits `0..num_qubits` and clbits `0..num_clbits`.
    pub fn with_size(num_qubits: u32, num_clbits: u32) -> Self {
        let mut dag = Self::new();
        for q in 0..num_qubits {
            dag.add_qubit(QubitId(q));
        }
        for c in 0..num_clbits {
            dag.add_clbit(ClbitId(c));
        }
        dag
    }

    /// An empty DAG with the same wires and calibrations as `self`.
    pub fn copy_empty_like(&self) -> Self {
        let mut dag = Self::new();
        for qubit in self.qubits() {
            dag.add_qubit(qubit);
        }
        for clbit in self.clbits() {
            dag.add_clbit(clbit);
        }
        dag.calibrations = self.calibrations.clone();
        dag
    }

    /// Add a qubit to the circuit.
    pub fn add_qubit(&mut self, qubit: QubitId) {
        if self.qubit_inputs.contains_key(&qubit) {
            return;
        }
        let wire = WireId::Qubit(qubit);
        let in_node = self.graph.add_node(DagNode::In(wire));
        let out_node = self.graph.add_node(DagNode::Out(wire));
        self.graph.add_edge(in_node, out_node, DagEdge { wire });
        self.qubit_inputs.insert(qubit, in_node);
        self.qubit_outputs.insert(qubit, out_node);
        self.wire_front.insert(wire, in_node);
    }

    /// Add a classical bit to the circuit.
    pub fn add_clbit(&mut self, clbit: ClbitId) {
        if self.clbit_inputs.contains_key(&clbit) {
            return;
        }
        let wire = WireId::Clbit(clbit);
        let in_node = self.graph.add_node(DagNode::In(wire));
        let out_node = self.graph.add_node(DagNode::Out(wire));
        self.graph.add_edge(in_node, out_node, DagEdge { wire });
        self.clbit_inputs.insert(clbit, in_node);
        self.clbit_outputs.insert(clbit, out_node);
        self.wire_front.insert(wire, in_node);
    }

    /// Append an instruction at the end of its wires.
    #[allow(clippy::cast_possible_truncation)]
    pub fn apply(&mut self, instruction: Instruction) -> IrResult<NodeIndex> {
        let gate_name = Some(instruction.name().to_string());

        match &instruction.kind {
            InstructionKind::Gate(gate) => {
                let expected = gate.num_qubits() as usize;
                let got = instruction.qubits.len();
                if expected != got {
                    return Err(IrError::QubitCountMismatch {
                        gate_name: gate.name().to_string(),
                        expected: expected as u32,
                        got: got as u32,
                    });
                }
            }
            InstructionKind::Delay { duration, .. } => {
                if !duration.is_finite() || *duration < 0.0 {
                    return Err(IrError::InvalidDuration(*duration));
                }
            }
            _ => {}
        }

        for &qubit in &instruction.qubits {
            if !self.qubit_inputs.contains_key(&qubit) {
                return Err(IrError::QubitNotFound {
                    qubit,
                    gate_name: gate_name.clone(),
                });
            }
        }

        for &clbit in &instruction.clbits {
            if !self.clbit_inputs.contains_key(&clbit) {
                return Err(IrError::ClbitNotFound {
                    clbit,
                    gate_name: gate_name.clone(),
                });
            }
        }

        let mut seen = FxHashSet::default();
        for &qubit in &instruction.qubits {
            if !seen.insert(qubit) {
                return Err(IrError::DuplicateQubit {
                    qubit,
                    gate_name: gate_name.clone(),
                });
            }
        }

        let wires: Vec<(WireId, NodeIndex)> = instruction
            .qubits
            .iter()
            .map(|&q| (WireId::Qubit(q), self.qubit_outputs[&q]))
            .chain(
                instruction
                    .clbits
                    .iter()
                    .map(|&c| (WireId::Clbit(c), self.clbit_outputs[&c])),
            )
            .collect();

        let op_node = self.graph.add_node(DagNode::Op(instruction));

        for (wire, out_node) in wires {
            let prev_node = self.wire_front[&wire];

            let eid = self
                .graph
                .edges_directed(prev_node, Direction::Outgoing)
                .find(|e| e.weight().wire == wire && e.target() == out_node)
                .map(|e| e.id())
                .ok_or_else(|| {
                    IrError::InvalidDag(format!(
                        "Missing edge from predecessor to output on wire {wire:?}"
                    ))
                })?;
            self.graph.remove_edge(eid);
            self.graph.add_edge(prev_node, op_node, DagEdge { wire });
            self.graph.add_edge(op_node, out_node, DagEdge { wire });
            self.wire_front.insert(wire, op_node);
        }

        Ok(op_node)
    }

    /// Node indices of the whole graph in deterministic topological order.
    ///
    /// Kahn's algorithm with a min-heap on node index: among ready nodes the
    /// oldest one is emitted first.
    fn topological_order(&self) -> Vec<NodeIndex> {
        let mut in_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|n| self.graph.edges_directed(n, Direction::Incoming).count())
            .collect();

        let mut ready: BinaryHeap<Reverse<NodeIndex>> = self
            .graph
            .node_indices()
            .filter(|n| in_degree[n.index()] == 0)
            .map(Reverse)
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse(node)) = ready.pop() {
            order.push(node);
            for edge in self.graph.edges_directed(node, Direction::Outgoing) {
                let target = edge.target();
                in_degree[target.index()] -= 1;
                if in_degree[target.index()] == 0 {
                    ready.push(Reverse(target));
                }
            }
        }
        order
    }

    /// Iterate over operations in topological order.
    pub fn topological_ops(&self) -> impl Iterator<Item = (NodeIndex, &Instruction)> {
        self.topological_order()
            .into_iter()
            .filter_map(|idx| self.graph[idx].instruction().map(|inst| (idx, inst)))
    }

    /// Operations touching `qubit`, in wire order.
    pub fn ops_on_qubit(&self, qubit: QubitId) -> Vec<&Instruction> {
        self.topological_ops()
            .filter(|(_, inst)| inst.qubits.contains(&qubit))
            .map(|(_, inst)| inst)
            .collect()
    }

    /// Get an instruction by node index.
    #[inline]
    pub fn get_instruction(&self, node: NodeIndex) -> Option<&Instruction> {
        self.graph.node_weight(node).and_then(DagNode::instruction)
    }

    /// Append every operation of `other` onto this DAG.
    ///
    /// Qubit `QubitId(i)` of `other` lands on `qubit_map[i]`. Classical bits
    /// keep their identity. Calibrations of `other` are copied with their
    /// qubit tuples remapped the same way. Returns the added nodes in
    /// topological order.
    pub fn compose(
        &mut self,
        other: &CircuitDag,
        qubit_map: &[QubitId],
    ) -> IrResult<Vec<NodeIndex>> {
        let remap = |q: QubitId| -> IrResult<QubitId> {
            qubit_map
                .get(q.0 as usize)
                .copied()
                .ok_or_else(|| IrError::InvalidDag(format!("No mapping for fragment qubit {q}")))
        };

        let mut added = Vec::with_capacity(other.num_ops());
        for (_, inst) in other.topological_ops() {
            let mut mapped = inst.clone();
            mapped.qubits = inst
                .qubits
                .iter()
                .map(|&q| remap(q))
                .collect::<IrResult<_>>()?;
            added.push(self.apply(mapped)?);
        }

        for (key, schedule) in &other.calibrations {
            let qubits = key
                .qubits
                .iter()
                .map(|&q| remap(q))
                .collect::<IrResult<Vec<_>>>()?;
            self.calibrations
                .insert(CalibrationKey::new(key.gate.clone(), qubits), schedule.clone());
        }
        Ok(added)
    }

    /// A new DAG with every wire's operation order reversed.
    pub fn reversed(&self) -> IrResult<Self> {
        let mut dag = self.copy_empty_like();
        let ops: Vec<Instruction> = self
            .topological_ops()
            .map(|(_, inst)| inst.clone())
            .collect();
        for inst in ops.into_iter().rev() {
            dag.apply(inst)?;
        }
        Ok(dag)
    }

    /// Attach a pulse calibration for `gate` on `qubits`.
    pub fn add_calibration(
        &mut self,
        gate: impl Into<String>,
        qubits: impl IntoIterator<Item = QubitId>,
        schedule: PulseSchedule,
    ) {
        self.calibrations
            .insert(CalibrationKey::new(gate, qubits), schedule);
    }

    /// Look up the calibration of `gate` on `qubits`.
    pub fn calibration(&self, gate: &str, qubits: &[QubitId]) -> Option<&PulseSchedule> {
        self.calibrations
            .get(&CalibrationKey::new(gate, qubits.iter().copied()))
    }

    /// All calibrations, ordered by key.
    pub fn calibrations(&self) -> impl Iterator<Item = (&CalibrationKey, &PulseSchedule)> {
        self.calibrations.iter()
    }

    /// Get the number of qubits.
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.qubit_inputs.len()
    }

    /// Get the number of classical bits.
    #[inline]
    pub fn num_clbits(&self) -> usize {
        self.clbit_inputs.len()
    }

    /// Get the number of operations.
    ///
    /// Computed as total nodes minus input and output nodes (2 per qubit + 2 per clbit).
    #[inline]
    pub fn num_ops(&self) -> usize {
        let io_nodes = 2 * (self.qubit_inputs.len() + self.clbit_inputs.len());
        self.graph.node_count().saturating_sub(io_nodes)
    }

    /// Calculate the circuit depth.
    pub fn depth(&self) -> usize {
        let mut depths: FxHashMap<NodeIndex, usize> =
            FxHashMap::with_capacity_and_hasher(self.graph.node_count(), Default::default());
        let mut max_depth = 0usize;

        for node in self.topological_order() {
            let max_pred_depth = self
                .graph
                .edges_directed(node, Direction::Incoming)
                .map(|e| depths.get(&e.source()).copied().unwrap_or(0))
                .max()
                .unwrap_or(0);

            let node_depth = if self.graph[node].is_op() {
                max_pred_depth + 1
            } else {
                max_pred_depth
            };

            max_depth = max_depth.max(node_depth);
            depths.insert(node, node_depth);
        }

        max_depth
    }

    /// Qubits in ascending order.
    pub fn qubits(&self) -> impl Iterator<Item = QubitId> + '_ {
        let mut qubits: Vec<_> = self.qubit_inputs.keys().copied().collect();
        qubits.sort_unstable();
        qubits.into_iter()
    }

    /// Classical bits in ascending order.
    pub fn clbits(&self) -> impl Iterator<Item = ClbitId> + '_ {
        let mut clbits: Vec<_> = self.clbit_inputs.keys().copied().collect();
        clbits.sort_unstable();
        clbits.into_iter()
    }

    /// Check whether `qubit` is a wire of this DAG.
    #[inline]
    pub fn has_qubit(&self, qubit: QubitId) -> bool {
        self.qubit_inputs.contains_key(&qubit)
    }

    /// Get a reference to the underlying graph.
    pub fn graph(&self) -> &DiGraph<DagNode, DagEdge, u32> {
        &self.graph
    }

    /// Verify the structural integrity of the DAG.
    ///
    /// Checks that the graph is acyclic and that every qubit wire forms an
    /// unbroken path from its In node to its Out node.
    pub fn verify_integrity(&self) -> IrResult<()> {
        if petgraph::algo::is_cyclic_directed(&self.graph) {
            return Err(IrError::InvalidDag("Graph contains a cycle".into()));
        }

        for (&qubit, &in_node) in &self.qubit_inputs {
            let out_node = self
                .qubit_outputs
                .get(&qubit)
                .copied()
                .ok_or_else(|| IrError::InvalidDag(format!("Qubit {qubit} has no Out node")))?;
            let wire = WireId::Qubit(qubit);

            let mut current = in_node;
            let mut steps = 0;
            while current != out_node {
                current = self
                    .graph
                    .edges_directed(current, Direction::Outgoing)
                    .find(|e| e.weight().wire == wire)
                    .map(|e| e.target())
                    .ok_or_else(|| {
                        IrError::InvalidDag(format!(
                            "Wire for qubit {qubit} is broken at node {current:?}"
                        ))
                    })?;
                steps += 1;
                if steps > self.graph.node_count() {
                    return Err(IrError::InvalidDag(format!(
                        "Wire for qubit {qubit} does not terminate"
                    )));
                }
            }
        }

        Ok(())
    }
}
