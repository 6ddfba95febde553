//! Pulse schedules attached to custom gates as calibrations.
//!
//! A [`PulseSchedule`] is the single-channel program a calibrated gate
//! expands to on the control hardware: frame changes, waveform plays and
//! idle slots. Only the duration and the op list matter to the scheduler;
//! waveforms are referenced by name and never sampled here.

use serde::{Deserialize, Serialize};

/// One instruction of a pulse schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PulseOp {
    /// Virtual frame change; takes no time.
    ShiftPhase {
        /// Phase in radians.
        phase: f64,
    },
    /// Play a named, pre-calibrated waveform.
    Play {
        /// Waveform identifier on the control system.
        waveform: String,
        /// Length in ticks.
        duration: u64,
    },
    /// Idle the channel.
    Delay {
        /// Length in ticks.
        duration: u64,
    },
}

impl PulseOp {
    /// Duration of this op in ticks.
    #[inline]
    pub fn duration(&self) -> u64 {
        match self {
            PulseOp::ShiftPhase { .. } => 0,
            PulseOp::Play { duration, .. } | PulseOp::Delay { duration } => *duration,
        }
    }
}

/// A named single-channel pulse program.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PulseSchedule {
    /// Schedule name.
    pub name: String,
    /// Ops in playback order.
    #[serde(default)]
    pub ops: Vec<PulseOp>,
}

impl PulseSchedule {
    /// Create an empty schedule.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ops: vec![],
        }
    }

    /// Total duration in ticks.
    pub fn duration(&self) -> u64 {
        self.ops.iter().map(PulseOp::duration).sum()
    }

    /// Append a frame change.
    #[must_use]
    pub fn shift_phase(mut self, phase: f64) -> Self {
        self.ops.push(PulseOp::ShiftPhase { phase });
        self
    }

    /// Append a waveform play.
    #[must_use]
    pub fn play(mut self, waveform: impl Into<String>, duration: u64) -> Self {
        self.ops.push(PulseOp::Play {
            waveform: waveform.into(),
            duration,
        });
        self
    }

    /// Inline every op of `other` at the end of this schedule.
    #[must_use]
    pub fn call(mut self, other: &PulseSchedule) -> Self {
        self.ops.extend(other.ops.iter().cloned());
        self
    }

    /// Wrap `inner` in a `+phase` / `-phase` frame change pair.
    ///
    /// Rotating the frame by `phase` before a calibrated pi pulse turns the
    /// rotation axis, so a Y pulse is an X pulse at `phase = pi/2`.
    pub fn phase_rotated(name: impl Into<String>, inner: &PulseSchedule, phase: f64) -> Self {
        Self::new(name)
            .shift_phase(phase)
            .call(inner)
            .shift_phase(-phase)
    }
}
