//! Ordered component lists and the duration-fitting algorithm.

use dynadd_ir::{CircuitDag, QubitId};

use super::component::Component;
use crate::error::{CompileError, CompileResult};

/// A decoupling sequence: components with relative weights.
///
/// Fixed components carry no weight. Scalable delays share whatever time
/// the fixed components leave free, in proportion to their weights. Each
/// pushed element keeps its own slot when the sequence is built.
#[derive(Debug, Clone)]
pub struct Sequence {
    name: String,
    elements: Vec<(Component, Option<f64>)>,
}

impl Sequence {
    /// Create an empty sequence.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            elements: vec![],
        }
    }

    /// Build a sequence from parallel component and weight lists.
    ///
    /// Without weights, every scalable component gets weight 1.
    pub fn from_components(
        name: impl Into<String>,
        components: Vec<Component>,
        weights: Option<Vec<Option<f64>>>,
    ) -> CompileResult<Self> {
        let mut sequence = Self::new(name);
        match weights {
            Some(weights) => {
                if weights.len() != components.len() {
                    return Err(CompileError::InvalidSequence(format!(
                        "{} components but {} weights",
                        components.len(),
                        weights.len()
                    )));
                }
                for (component, weight) in components.into_iter().zip(weights) {
                    sequence.push(component, weight)?;
                }
            }
            None => {
                for component in components {
                    sequence.push(component, None)?;
                }
            }
        }
        Ok(sequence)
    }

    /// Append a component.
    ///
    /// A scalable component without a weight gets weight 1. Fixed
    /// components must not be given a weight.
    pub fn push(&mut self, component: Component, weight: Option<f64>) -> CompileResult<()> {
        if !component.is_scalable() {
            if let Some(w) = weight {
                return Err(CompileError::InvalidSequence(format!(
                    "fixed component '{}' given weight {w}",
                    component.name()
                )));
            }
            self.elements.push((component, None));
            return Ok(());
        }

        let weight = weight.unwrap_or(1.0);
        if !weight.is_finite() || weight <= 0.0 {
            return Err(CompileError::InvalidSequence(format!(
                "delay weight must be positive, got {weight}"
            )));
        }

        self.elements.push((component, Some(weight)));
        Ok(())
    }

    /// Append every element of `other`.
    ///
    /// When this sequence ends with a delay and `other` starts with one, the
    /// two become a single delay carrying both weights, so repeated cycles
    /// do not leave back-to-back idle slots.
    pub fn extend(&mut self, other: &Sequence) -> CompileResult<()> {
        let mut rest = other.elements.iter();
        if let (Some((last, Some(last_weight))), Some((first, Some(first_weight)))) =
            (self.elements.last_mut(), other.elements.first())
        {
            if last.is_scalable() && first.is_scalable() {
                *last_weight += first_weight;
                rest.next();
            }
        }
        for (component, weight) in rest {
            self.push(component.clone(), *weight)?;
        }
        Ok(())
    }

    /// Sequence name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check if the sequence has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Components and their weights, in order.
    pub fn elements(&self) -> &[(Component, Option<f64>)] {
        &self.elements
    }

    /// The weight list, `None` for fixed components.
    pub fn weights(&self) -> Vec<Option<f64>> {
        self.elements.iter().map(|(_, w)| *w).collect()
    }

    /// Sum of the weights of all scalable components.
    pub fn total_weight(&self) -> f64 {
        self.elements.iter().filter_map(|(_, w)| *w).sum()
    }

    /// Ticks taken by the fixed components on `qubits`.
    pub fn fixed_duration(&self, qubits: &[u32]) -> CompileResult<u64> {
        let mut total = 0;
        for (component, _) in &self.elements {
            if !component.is_scalable() {
                total += component.duration(qubits)?;
            }
        }
        Ok(total)
    }

    /// Whether a window of `window` ticks leaves room for the delays.
    pub fn can_be_used(&self, window: u64, qubits: &[u32]) -> CompileResult<bool> {
        Ok(window > self.fixed_duration(qubits)?)
    }

    /// Tick length of each scalable slot when fitted into `window`.
    ///
    /// Each slot is `round(flex * w / W)` where `flex` is the window minus
    /// the fixed part and `W` the total weight. The sum may differ from
    /// `flex` by up to one tick per slot.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn slot_durations(&self, window: u64, qubits: &[u32]) -> CompileResult<Vec<u64>> {
        let fixed = self.fixed_duration(qubits)?;
        if window <= fixed {
            return Err(CompileError::WindowTooShort {
                sequence: self.name.clone(),
                window,
                fixed,
            });
        }
        let flex = (window - fixed) as f64;
        let total = self.total_weight();
        Ok(self
            .elements
            .iter()
            .filter_map(|(_, w)| *w)
            .map(|w| (flex * w / total).round() as u64)
            .collect())
    }

    /// Realize the sequence as a fragment lasting `window` ticks.
    ///
    /// The fragment has one local qubit per entry of `qubits`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn build(&self, window: u64, qubits: &[u32]) -> CompileResult<CircuitDag> {
        let slots = self.slot_durations(window, qubits)?;
        let mut slots = slots.into_iter();

        let mut fragment = CircuitDag::with_size(qubits.len() as u32, 0);
        let local: Vec<QubitId> = (0..qubits.len() as u32).map(QubitId).collect();

        for (component, weight) in &self.elements {
            if weight.is_some() {
                let ticks = slots.next().ok_or_else(|| {
                    CompileError::InvalidSequence("slot count mismatch".into())
                })?;
                component.scale_to(ticks)?.apply(&mut fragment, qubits, &local)?;
            } else {
                component.apply(&mut fragment, qubits, &local)?;
            }
        }
        Ok(fragment)
    }
}
