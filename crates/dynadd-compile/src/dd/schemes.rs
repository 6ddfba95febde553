//! Canonical decoupling schemes.
//!
//! Every scheme is a plain function returning a [`Sequence`]. Gate-based
//! schemes translate their primitives through the backend; pulse-based ones
//! derive their pulses from the backend's calibrated `x` schedule by frame
//! rotation, so a Y pulse costs exactly what an X pulse costs.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use dynadd_ir::PulseSchedule;

use super::component::Component;
use super::sequence::Sequence;
use crate::backend::Calibration;
use crate::error::{CompileError, CompileResult};

/// Available decoupling schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// Carr–Purcell: X pulses.
    CarrPurcell,
    /// Carr–Purcell–Meiboom–Gill with gate Y.
    CpmgGate,
    /// Carr–Purcell–Meiboom–Gill with frame-rotated X pulses.
    CpmgPulse,
    /// XY-4 with gate X and Y.
    Xy4Gate,
    /// XY-4 with gate X and a frame-rotated Y pulse.
    Xy4Pulse,
    /// Knill decoupling: XY-4 with composite robust pulses.
    Kdd,
    /// Uhrig with gate Y.
    UhrigGate,
    /// Uhrig with frame-rotated Y pulses.
    UhrigPulse,
    /// Hahn spin echo: a single Y pulse.
    HahnEcho,
}

impl Scheme {
    /// Every scheme, in listing order.
    pub const ALL: [Scheme; 9] = [
        Scheme::CarrPurcell,
        Scheme::CpmgGate,
        Scheme::CpmgPulse,
        Scheme::Xy4Gate,
        Scheme::Xy4Pulse,
        Scheme::Kdd,
        Scheme::UhrigGate,
        Scheme::UhrigPulse,
        Scheme::HahnEcho,
    ];

    /// Short name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Scheme::CarrPurcell => "cp",
            Scheme::CpmgGate => "cpmg",
            Scheme::CpmgPulse => "cpmg-pulse",
            Scheme::Xy4Gate => "xy4",
            Scheme::Xy4Pulse => "xy4-pulse",
            Scheme::Kdd => "kdd",
            Scheme::UhrigGate => "uhrig",
            Scheme::UhrigPulse => "uhrig-pulse",
            Scheme::HahnEcho => "hahn",
        }
    }

    /// One-line description.
    pub fn description(self) -> &'static str {
        match self {
            Scheme::CarrPurcell => "Carr-Purcell, equally spaced X gates",
            Scheme::CpmgGate => "Carr-Purcell-Meiboom-Gill, equally spaced Y gates",
            Scheme::CpmgPulse => "CPMG with Y pulses derived from the X calibration",
            Scheme::Xy4Gate => "XY-4, alternating X and Y gates",
            Scheme::Xy4Pulse => "XY-4 with a Y pulse derived from the X calibration",
            Scheme::Kdd => "Knill DD, XY-4 built from five-pulse composite rotations",
            Scheme::UhrigGate => "Uhrig, Y gates at sin^2 spaced instants",
            Scheme::UhrigPulse => "Uhrig with Y pulses derived from the X calibration",
            Scheme::HahnEcho => "Hahn spin echo, one centered Y pulse",
        }
    }

    /// Whether the scheme needs pulse calibrations from the backend.
    pub fn uses_pulses(self) -> bool {
        matches!(
            self,
            Scheme::CpmgPulse
                | Scheme::Xy4Pulse
                | Scheme::Kdd
                | Scheme::UhrigPulse
                | Scheme::HahnEcho
        )
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scheme {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Scheme::ALL
            .into_iter()
            .find(|scheme| scheme.name() == lower)
            .ok_or_else(|| {
                CompileError::InvalidOption(format!(
                    "unknown scheme '{s}', expected one of: {}",
                    Scheme::ALL.map(Scheme::name).join(", ")
                ))
            })
    }
}

/// Knobs shared by the scheme factories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemeOptions {
    /// Pi pulses for CP/CPMG/Uhrig, cycles for XY-4/KDD. Ignored by Hahn.
    pub repetitions: usize,
    /// Bracket CP/CPMG/Uhrig with `sx` … `sxdg`.
    pub pre_post_rotations: bool,
    /// Split the outer delays of XY-4/KDD in halves.
    pub symmetric: bool,
}

impl Default for SchemeOptions {
    fn default() -> Self {
        Self {
            repetitions: 1,
            pre_post_rotations: false,
            symmetric: true,
        }
    }
}

fn check_repetitions(repetitions: usize) -> CompileResult<()> {
    if repetitions == 0 {
        return Err(CompileError::InvalidSequence(
            "repetition count must be at least 1".into(),
        ));
    }
    Ok(())
}

fn bracket(
    sequence: Sequence,
    rotations: Option<(Component, Component)>,
) -> CompileResult<Sequence> {
    let Some((pre, post)) = rotations else {
        return Ok(sequence);
    };
    let mut bracketed = Sequence::new(sequence.name());
    bracketed.push(pre, None)?;
    bracketed.extend(&sequence)?;
    bracketed.push(post, None)?;
    Ok(bracketed)
}

/// `τ · (P · τ)ⁿ`: `n` equally spaced copies of `pulse`.
///
/// `rotations` optionally wraps the train in a pre/post pair.
pub fn carr_purcell(
    name: &str,
    pulse: Component,
    repetitions: usize,
    rotations: Option<(Component, Component)>,
) -> CompileResult<Sequence> {
    check_repetitions(repetitions)?;
    let mut seq = Sequence::new(name);
    seq.push(Component::delay(), Some(1.0))?;
    for _ in 0..repetitions {
        seq.push(pulse.clone(), None)?;
        seq.push(Component::delay(), Some(1.0))?;
    }
    bracket(seq, rotations)
}

/// Uhrig instants `sin²(π·i / 2n)` for `i = 0..=n`.
#[allow(clippy::cast_precision_loss)]
pub fn uhrig_breakpoints(n: usize) -> Vec<f64> {
    (0..=n)
        .map(|i| {
            let s = (PI * i as f64 / (2.0 * n as f64)).sin();
            s * s
        })
        .collect()
}

/// Relative lengths of the `n` Uhrig delays.
pub fn uhrig_weights(n: usize) -> Vec<f64> {
    uhrig_breakpoints(n).windows(2).map(|w| w[1] - w[0]).collect()
}

/// Uhrig decoupling of order `n`.
///
/// Order 1 is a plain echo `τ · P · τ`. Higher orders place `n − 1` pulses
/// between `n` delays weighted by [`uhrig_weights`].
pub fn uhrig(
    name: &str,
    pulse: Component,
    n: usize,
    rotations: Option<(Component, Component)>,
) -> CompileResult<Sequence> {
    check_repetitions(n)?;
    let mut seq = Sequence::new(name);
    if n == 1 {
        seq.push(Component::delay(), Some(1.0))?;
        seq.push(pulse, None)?;
        seq.push(Component::delay(), Some(1.0))?;
    } else {
        let weights = uhrig_weights(n);
        seq.push(Component::delay(), Some(weights[0]))?;
        for &w in &weights[1..] {
            seq.push(pulse.clone(), None)?;
            seq.push(Component::delay(), Some(w))?;
        }
    }
    bracket(seq, rotations)
}

/// XY-4: `X · Y · X · Y` with delays between, repeated `cycles` times.
///
/// The symmetric form starts and ends on half delays.
pub fn xy4(
    name: &str,
    x: Component,
    y: Component,
    cycles: usize,
    symmetric: bool,
) -> CompileResult<Sequence> {
    check_repetitions(cycles)?;
    let (outer, tail) = if symmetric {
        (0.5, Some(0.5))
    } else {
        (1.0, None)
    };

    let mut cycle = Sequence::new(name);
    cycle.push(Component::delay(), Some(outer))?;
    for (i, pulse) in [&x, &y, &x, &y].into_iter().enumerate() {
        cycle.push(pulse.clone(), None)?;
        if i < 3 {
            cycle.push(Component::delay(), Some(1.0))?;
        }
    }
    if let Some(w) = tail {
        cycle.push(Component::delay(), Some(w))?;
    }

    let mut seq = Sequence::new(name);
    for _ in 0..cycles {
        seq.extend(&cycle)?;
    }
    Ok(seq)
}

/// Pulse components of the KDD composite rotation.
#[derive(Debug, Clone)]
pub struct KddPulses {
    /// X pulse with the frame turned by π/6.
    pub x_pi_6: Component,
    /// The calibrated X pulse.
    pub x: Component,
    /// X pulse with the frame turned by π/2.
    pub x_pi_2: Component,
    /// Frame change by π/2.
    pub rz_2: Component,
    /// Frame change by −π/2.
    pub rz_m2: Component,
    /// Frame change by −π/3.
    pub rz_m3: Component,
}

impl KddPulses {
    /// Derive the KDD pulses from the calibrated `x` schedule of every qubit.
    pub fn from_backend(backend: &dyn Calibration) -> CompileResult<Self> {
        let xs = x_schedules(backend)?;
        Ok(Self {
            x_pi_6: map_x(&xs, "x_pi_6", |x| {
                PulseSchedule::phase_rotated("x_pi_6", x, PI / 6.0)
            }),
            x: map_x(&xs, "x", PulseSchedule::clone),
            x_pi_2: map_x(&xs, "x_pi_2", |x| {
                PulseSchedule::phase_rotated("x_pi_2", x, PI / 2.0)
            }),
            rz_2: map_x(&xs, "rz_2", |_| PulseSchedule::new("rz_2").shift_phase(PI / 2.0)),
            rz_m2: map_x(&xs, "rz_-2", |_| {
                PulseSchedule::new("rz_-2").shift_phase(-PI / 2.0)
            }),
            rz_m3: map_x(&xs, "rz_-3", |_| {
                PulseSchedule::new("rz_-3").shift_phase(-PI / 3.0)
            }),
        })
    }

    /// `x_pi_6 τ x τ x_pi_2 τ x τ x_pi_6 rz_-3`, a robust π rotation.
    fn base_x(&self, seq: &mut Sequence) -> CompileResult<()> {
        seq.push(self.x_pi_6.clone(), None)?;
        seq.push(Component::delay(), Some(1.0))?;
        seq.push(self.x.clone(), None)?;
        seq.push(Component::delay(), Some(1.0))?;
        seq.push(self.x_pi_2.clone(), None)?;
        seq.push(Component::delay(), Some(1.0))?;
        seq.push(self.x.clone(), None)?;
        seq.push(Component::delay(), Some(1.0))?;
        seq.push(self.x_pi_6.clone(), None)?;
        seq.push(self.rz_m3.clone(), None)
    }
}

/// Knill decoupling: XY-4 whose X and Y are KDD composite pulses.
///
/// Symmetric blocks are `τ/2 · K · τ/2`; asymmetric blocks are `τ · K`.
/// The Y block is the X block inside a π/2 frame change.
pub fn kdd(pulses: &KddPulses, cycles: usize, symmetric: bool) -> CompileResult<Sequence> {
    check_repetitions(cycles)?;
    let (lead, tail) = if symmetric {
        (0.5, Some(0.5))
    } else {
        (1.0, None)
    };

    let mut x_block = Sequence::new("kdd");
    x_block.push(Component::delay(), Some(lead))?;
    pulses.base_x(&mut x_block)?;
    if let Some(w) = tail {
        x_block.push(Component::delay(), Some(w))?;
    }

    let mut y_block = Sequence::new("kdd");
    y_block.push(Component::delay(), Some(lead))?;
    y_block.push(pulses.rz_2.clone(), None)?;
    pulses.base_x(&mut y_block)?;
    y_block.push(pulses.rz_m2.clone(), None)?;
    if let Some(w) = tail {
        y_block.push(Component::delay(), Some(w))?;
    }

    let mut seq = Sequence::new("kdd");
    for _ in 0..cycles {
        for block in [&x_block, &y_block, &x_block, &y_block] {
            seq.extend(block)?;
        }
    }
    Ok(seq)
}

/// Hahn echo `τ · Y · τ`.
pub fn hahn_echo(y: Component) -> CompileResult<Sequence> {
    Sequence::from_components(
        "hahn",
        vec![Component::delay(), y, Component::delay()],
        Some(vec![Some(1.0), None, Some(1.0)]),
    )
}

/// A pulse component with `f` applied to each qubit's `x` schedule.
fn map_x(
    x_schedules: &FxHashMap<Vec<u32>, PulseSchedule>,
    name: &str,
    f: impl Fn(&PulseSchedule) -> PulseSchedule,
) -> Component {
    let schedules = x_schedules
        .iter()
        .map(|(qubits, x)| (qubits.clone(), f(x)))
        .collect();
    Component::pulse(name, schedules)
}

/// The calibrated `x` schedule of every qubit, keyed by `[qubit]`.
fn x_schedules(backend: &dyn Calibration) -> CompileResult<FxHashMap<Vec<u32>, PulseSchedule>> {
    (0..backend.num_qubits())
        .map(|q| {
            backend
                .pulse_schedule("x", &[q])
                .cloned()
                .map(|s| (vec![q], s))
                .ok_or_else(|| CompileError::MissingPulseSchedule {
                    gate: "x".into(),
                    qubits: vec![q],
                })
        })
        .collect()
}

/// Y pulses `shift(π/2) · x · shift(−π/2)` for every qubit.
pub fn y_pulse(backend: &dyn Calibration) -> CompileResult<Component> {
    let xs = x_schedules(backend)?;
    Ok(map_x(&xs, "y", |x| {
        PulseSchedule::phase_rotated("y_gate", x, PI / 2.0)
    }))
}

fn quarter_turns(
    opts: &SchemeOptions,
    backend: &Arc<dyn Calibration>,
) -> CompileResult<Option<(Component, Component)>> {
    if !opts.pre_post_rotations {
        return Ok(None);
    }
    Ok(Some((
        Component::gate("sx", Arc::clone(backend))?,
        Component::gate("sxdg", Arc::clone(backend))?,
    )))
}

/// Build `scheme` for `backend`.
pub fn build_scheme(
    scheme: Scheme,
    opts: &SchemeOptions,
    backend: Arc<dyn Calibration>,
) -> CompileResult<Sequence> {
    debug!(
        "Building scheme {} for backend {} ({:?})",
        scheme,
        backend.name(),
        opts
    );
    let n = opts.repetitions;
    let seq = match scheme {
        Scheme::CarrPurcell => carr_purcell(
            scheme.name(),
            Component::gate("x", Arc::clone(&backend))?,
            n,
            quarter_turns(opts, &backend)?,
        )?,
        Scheme::CpmgGate => carr_purcell(
            scheme.name(),
            Component::gate("y", Arc::clone(&backend))?,
            n,
            quarter_turns(opts, &backend)?,
        )?,
        Scheme::CpmgPulse => carr_purcell(
            scheme.name(),
            y_pulse(backend.as_ref())?,
            n,
            quarter_turns(opts, &backend)?,
        )?,
        Scheme::Xy4Gate => xy4(
            scheme.name(),
            Component::gate("x", Arc::clone(&backend))?,
            Component::gate("y", Arc::clone(&backend))?,
            n,
            opts.symmetric,
        )?,
        Scheme::Xy4Pulse => xy4(
            scheme.name(),
            Component::gate("x", Arc::clone(&backend))?,
            y_pulse(backend.as_ref())?,
            n,
            opts.symmetric,
        )?,
        Scheme::Kdd => kdd(&KddPulses::from_backend(backend.as_ref())?, n, opts.symmetric)?,
        Scheme::UhrigGate => uhrig(
            scheme.name(),
            Component::gate("y", Arc::clone(&backend))?,
            n,
            quarter_turns(opts, &backend)?,
        )?,
        Scheme::UhrigPulse => uhrig(
            scheme.name(),
            y_pulse(backend.as_ref())?,
            n,
            quarter_turns(opts, &backend)?,
        )?,
        Scheme::HahnEcho => hahn_echo(y_pulse(backend.as_ref())?)?,
    };
    Ok(seq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendProperties;
    use crate::property::BasisGates;

    fn backend() -> Arc<dyn Calibration> {
        let mut b = BackendProperties::new("test", 2, 1e-9, BasisGates::ibm())
            .with_uniform_gate_length("x", 40e-9)
            .with_uniform_gate_length("sx", 20e-9)
            .with_uniform_gate_length("rz", 0.0);
        for q in 0..2 {
            b = b.with_pulse_calibration("x", [q], PulseSchedule::new("x").play("drag", 40));
        }
        Arc::new(b)
    }

    fn shape(seq: &Sequence) -> Vec<String> {
        seq.elements()
            .iter()
            .map(|(c, _)| c.name().to_string())
            .collect()
    }

    #[test]
    fn test_scheme_names_round_trip() {
        for scheme in Scheme::ALL {
            assert_eq!(scheme.name().parse::<Scheme>().unwrap(), scheme);
        }
        assert_eq!("XY4".parse::<Scheme>().unwrap(), Scheme::Xy4Gate);
        assert!("nope".parse::<Scheme>().is_err());
    }

    #[test]
    fn test_uhrig_weights() {
        let w = uhrig_weights(2);
        assert_eq!(w.len(), 2);
        assert!((w[0] - 0.5).abs() < 1e-12);
        assert!((w[1] - 0.5).abs() < 1e-12);

        let b = uhrig_breakpoints(4);
        assert!(b[0].abs() < 1e-12);
        assert!((b[4] - 1.0).abs() < 1e-12);
        assert!((uhrig_weights(5).iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_carr_purcell_shape() {
        let opts = SchemeOptions {
            repetitions: 2,
            ..SchemeOptions::default()
        };
        let seq = build_scheme(Scheme::CarrPurcell, &opts, backend()).unwrap();
        assert_eq!(shape(&seq), vec!["delay", "x", "delay", "x", "delay"]);
        assert_eq!(
            seq.weights(),
            vec![Some(1.0), None, Some(1.0), None, Some(1.0)]
        );
    }

    #[test]
    fn test_cpmg_rotations() {
        let opts = SchemeOptions {
            pre_post_rotations: true,
            ..SchemeOptions::default()
        };
        let seq = build_scheme(Scheme::CpmgGate, &opts, backend()).unwrap();
        assert_eq!(shape(&seq), vec!["sx", "delay", "y", "delay", "sxdg"]);
    }

    #[test]
    fn test_uhrig_order_one_is_echo() {
        let seq = build_scheme(Scheme::UhrigGate, &SchemeOptions::default(), backend()).unwrap();
        assert_eq!(shape(&seq), vec!["delay", "y", "delay"]);
    }

    #[test]
    fn test_uhrig_order_three() {
        let opts = SchemeOptions {
            repetitions: 3,
            ..SchemeOptions::default()
        };
        let seq = build_scheme(Scheme::UhrigPulse, &opts, backend()).unwrap();
        assert_eq!(shape(&seq), vec!["delay", "y", "delay", "y", "delay"]);
        let w: Vec<f64> = seq.weights().into_iter().flatten().collect();
        let expected = uhrig_weights(3);
        for (a, b) in w.iter().zip(&expected) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_xy4_symmetric_and_cycles() {
        let seq = build_scheme(Scheme::Xy4Gate, &SchemeOptions::default(), backend()).unwrap();
        assert_eq!(
            seq.weights(),
            vec![
                Some(0.5),
                None,
                Some(1.0),
                None,
                Some(1.0),
                None,
                Some(1.0),
                None,
                Some(0.5)
            ]
        );

        let opts = SchemeOptions {
            repetitions: 2,
            ..SchemeOptions::default()
        };
        let twice = build_scheme(Scheme::Xy4Gate, &opts, backend()).unwrap();
        // the half delays at the seam merge into one full delay
        assert_eq!(twice.len(), 17);
        assert_eq!(twice.weights()[8], Some(1.0));
    }

    #[test]
    fn test_xy4_asymmetric_ends_on_pulse() {
        let opts = SchemeOptions {
            symmetric: false,
            ..SchemeOptions::default()
        };
        let seq = build_scheme(Scheme::Xy4Pulse, &opts, backend()).unwrap();
        assert_eq!(
            shape(&seq),
            vec!["delay", "x", "delay", "y", "delay", "x", "delay", "y"]
        );
    }

    #[test]
    fn test_kdd_fixed_duration() {
        let seq = build_scheme(Scheme::Kdd, &SchemeOptions::default(), backend()).unwrap();
        // 4 blocks x 5 pulses x 40 ticks; frame changes are free
        assert_eq!(seq.fixed_duration(&[1]).unwrap(), 800);
        // 4 blocks with 4 inner delays, 3 merged seams, 2 outer halves
        assert_eq!(seq.weights().into_iter().flatten().count(), 4 * 4 + 3 + 2);
        assert!((seq.total_weight() - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_hahn_uses_pulse_y() {
        let seq = build_scheme(Scheme::HahnEcho, &SchemeOptions::default(), backend()).unwrap();
        assert_eq!(shape(&seq), vec!["delay", "y", "delay"]);
        assert_eq!(seq.fixed_duration(&[0]).unwrap(), 40);
    }

    #[test]
    fn test_pulse_schemes_need_x_calibration() {
        let bare: Arc<dyn Calibration> = Arc::new(
            BackendProperties::new("bare", 1, 1e-9, BasisGates::ibm())
                .with_uniform_gate_length("x", 40e-9),
        );
        let err = build_scheme(Scheme::HahnEcho, &SchemeOptions::default(), bare).unwrap_err();
        assert!(matches!(err, CompileError::MissingPulseSchedule { .. }));
    }

    #[test]
    fn test_zero_repetitions_rejected() {
        let opts = SchemeOptions {
            repetitions: 0,
            ..SchemeOptions::default()
        };
        assert!(build_scheme(Scheme::CarrPurcell, &opts, backend()).is_err());
    }
}
