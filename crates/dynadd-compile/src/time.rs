//! Conversion between physical time units and hardware ticks.
//!
//! All scheduling happens on the integer tick grid. Durations arrive either
//! in SI units (calibrated gate lengths, user delays) or already in `dt`;
//! these helpers move them onto the grid with three rounding policies:
//! raw float, floor, and exact-within-tolerance.

use dynadd_ir::TimeUnit;

use crate::error::{CompileError, CompileResult};

/// Largest distance from the tick grid accepted by [`to_ticks_exact`].
pub const DEFAULT_ALIGNMENT_TOLERANCE: f64 = 1e-3;

/// Convert `time` in `unit` to seconds.
///
/// `dt` values need the tick length; every other unit is a fixed power of ten.
pub fn to_seconds(time: f64, unit: TimeUnit, tick_length: Option<f64>) -> CompileResult<f64> {
    match unit.seconds_per_unit() {
        Some(scale) => Ok(time * scale),
        None => tick_length.map(|dt| time * dt).ok_or_else(|| {
            CompileError::MissingParameter(format!(
                "tick length is required to convert {time} dt to seconds"
            ))
        }),
    }
}

/// Convert `time` in `unit` to a (possibly fractional) number of ticks.
pub fn to_ticks_float(time: f64, unit: TimeUnit, tick_length: f64) -> f64 {
    match unit.seconds_per_unit() {
        Some(scale) => time * scale / tick_length,
        None => time,
    }
}

/// Convert to ticks, truncating toward the start of the window.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn to_ticks_rounded(time: f64, unit: TimeUnit, tick_length: f64) -> u64 {
    to_ticks_float(time, unit, tick_length).floor() as u64
}

/// Convert to ticks, requiring the value to sit on the tick grid.
///
/// Fails with [`CompileError::TimingAlignment`] when the fractional part is
/// further than `tolerance` from an integer.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn to_ticks_exact(
    time: f64,
    unit: TimeUnit,
    tick_length: f64,
    tolerance: f64,
) -> CompileResult<u64> {
    let ticks = to_ticks_float(time, unit, tick_length);
    let nearest = ticks.round();
    if !ticks.is_finite() || (ticks - nearest).abs() > tolerance {
        return Err(CompileError::TimingAlignment { time, unit, ticks });
    }
    Ok(nearest as u64)
}
