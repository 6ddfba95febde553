//! `PropertySet` and related types for pass communication.
//!
//! Passes share data through a [`PropertySet`]: the ground-state analysis
//! writes a [`FundamentalStateMap`], the decoupling pass records a
//! [`DdInsertionReport`], and callers may attach their own typed values.
//!
//! # Custom properties
//!
//! ```
//! use dynadd_compile::PropertySet;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct WindowBudget(u64);
//!
//! let mut props = PropertySet::new();
//! props.insert(WindowBudget(320));
//! assert_eq!(props.get::<WindowBudget>(), Some(&WindowBudget(320)));
//! ```

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};

use dynadd_ir::NodeIndex;

/// Basis gates for the target device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BasisGates {
    /// List of gate names in the basis.
    gates: Vec<String>,
}

impl BasisGates {
    /// Create a new basis gates set.
    pub fn new(gates: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            gates: gates.into_iter().map(Into::into).collect(),
        }
    }

    /// Check if a gate is in the basis.
    pub fn contains(&self, gate: &str) -> bool {
        self.gates.iter().any(|g| g == gate)
    }

    /// Get the basis gates.
    pub fn gates(&self) -> &[String] {
        &self.gates
    }

    /// Create IQM basis gates (PRX + CZ).
    pub fn iqm() -> Self {
        Self::new(["prx", "cz", "measure", "barrier", "delay"])
    }

    /// Create IBM basis gates (RZ + SX + X + CX).
    pub fn ibm() -> Self {
        Self::new(["id", "rz", "sx", "x", "cx", "measure", "reset", "barrier", "delay"])
    }

    /// Create IBM Heron basis gates (RZ + SX + X + CZ).
    pub fn heron() -> Self {
        Self::new(["id", "rz", "sx", "x", "cz", "measure", "reset", "barrier", "delay"])
    }
}

/// Per-node ground-state flags produced by the fundamental-state analysis.
///
/// Keys are node indices of the DAG the analysis ran on. A `true` entry
/// means the qubits of that node are provably in |0⟩ when it starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FundamentalStateMap {
    flags: FxHashMap<NodeIndex, bool>,
}

impl FundamentalStateMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the flag of a node.
    pub fn insert(&mut self, node: NodeIndex, in_ground_state: bool) {
        self.flags.insert(node, in_ground_state);
    }

    /// Flag of a node, if it was analyzed.
    pub fn get(&self, node: NodeIndex) -> Option<bool> {
        self.flags.get(&node).copied()
    }

    /// Number of analyzed nodes.
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Check if nothing was analyzed.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Number of nodes flagged as ground state.
    pub fn ground_count(&self) -> usize {
        self.flags.values().filter(|&&g| g).count()
    }

    /// Iterate over (node, flag) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, bool)> + '_ {
        self.flags.iter().map(|(&n, &g)| (n, g))
    }
}

/// What the decoupling pass did to the idle windows of a circuit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DdInsertionReport {
    /// Delay nodes inspected.
    pub delays_seen: usize,
    /// Delay nodes replaced by a decoupling sequence.
    pub delays_replaced: usize,
    /// Delay nodes flagged as idling in the ground state.
    pub ground_state_delays: usize,
    /// Ticks of idle time now covered by decoupling sequences.
    pub ticks_covered: u64,
}

/// Properties shared between compilation passes.
///
/// | Field | Type | Description |
/// |-------|------|-------------|
/// | `fundamental_state` | [`FundamentalStateMap`] | Ground-state flag per node |
///
/// Anything else travels through the type-keyed [`insert`](Self::insert) /
/// [`get`](Self::get) store; each type holds at most one value.
#[derive(Debug, Default)]
pub struct PropertySet {
    /// Ground-state flags, set by `FlagFundamentalState`.
    pub fundamental_state: Option<FundamentalStateMap>,

    /// Custom properties storage (type-erased).
    custom: FxHashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl PropertySet {
    /// Create a new empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a custom property.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        self.custom.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Get a custom property.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.custom
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Get a mutable custom property.
    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.custom
            .get_mut(&TypeId::of::<T>())
            .and_then(|v| v.downcast_mut())
    }

    /// Remove a custom property.
    pub fn remove<T: Any>(&mut self) -> Option<T> {
        self.custom
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|v| *v)
    }

    /// The last decoupling report, if the decoupling pass has run.
    pub fn dd_report(&self) -> Option<&DdInsertionReport> {
        self.get::<DdInsertionReport>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basis_gates() {
        let iqm = BasisGates::iqm();
        assert!(iqm.contains("prx"));
        assert!(iqm.contains("cz"));
        assert!(!iqm.contains("cx"));

        let ibm = BasisGates::ibm();
        assert!(ibm.contains("cx"));
        assert!(ibm.contains("rz"));
        assert!(!ibm.contains("prx"));
    }

    #[test]
    fn test_basis_gates_serialize_as_list() {
        let json = serde_json::to_string(&BasisGates::new(["rz", "sx"])).unwrap();
        assert_eq!(json, r#"["rz","sx"]"#);
    }

    #[test]
    fn test_fundamental_state_map() {
        let mut map = FundamentalStateMap::new();
        map.insert(NodeIndex::new(4), true);
        map.insert(NodeIndex::new(7), false);

        assert_eq!(map.get(NodeIndex::new(4)), Some(true));
        assert_eq!(map.get(NodeIndex::new(9)), None);
        assert_eq!(map.len(), 2);
        assert_eq!(map.ground_count(), 1);
    }

    #[test]
    #[allow(clippy::items_after_statements)]
    fn test_property_set_custom() {
        let mut props = PropertySet::new();

        #[derive(Debug, PartialEq)]
        struct CustomData(i32);

        props.insert(CustomData(42));
        assert_eq!(props.get::<CustomData>(), Some(&CustomData(42)));

        let removed = props.remove::<CustomData>();
        assert_eq!(removed, Some(CustomData(42)));
        assert_eq!(props.get::<CustomData>(), None);
    }

    #[test]
    fn test_dd_report_slot() {
        let mut props = PropertySet::new();
        assert!(props.dd_report().is_none());
        props.insert(DdInsertionReport {
            delays_seen: 3,
            delays_replaced: 2,
            ground_state_delays: 1,
            ticks_covered: 640,
        });
        assert_eq!(props.dd_report().unwrap().delays_replaced, 2);
    }
}
