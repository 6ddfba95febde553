//! Time units attached to delay instructions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::IrError;

/// Unit of a duration carried by a delay instruction.
///
/// Every unit except [`TimeUnit::Dt`] converts to seconds through a fixed
/// power of ten. `Dt` counts hardware clock ticks and needs the device tick
/// length to be meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// Picoseconds.
    Ps,
    /// Nanoseconds.
    Ns,
    /// Microseconds.
    Us,
    /// Milliseconds.
    Ms,
    /// Seconds.
    S,
    /// Hardware clock ticks.
    #[default]
    Dt,
}

impl TimeUnit {
    /// Seconds per unit, or `None` for [`TimeUnit::Dt`].
    #[inline]
    pub fn seconds_per_unit(self) -> Option<f64> {
        match self {
            TimeUnit::Ps => Some(1e-12),
            TimeUnit::Ns => Some(1e-9),
            TimeUnit::Us => Some(1e-6),
            TimeUnit::Ms => Some(1e-3),
            TimeUnit::S => Some(1.0),
            TimeUnit::Dt => None,
        }
    }

    /// Lowercase unit name as used in circuit files.
    pub fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Ps => "ps",
            TimeUnit::Ns => "ns",
            TimeUnit::Us => "us",
            TimeUnit::Ms => "ms",
            TimeUnit::S => "s",
            TimeUnit::Dt => "dt",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = IrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ps" => Ok(TimeUnit::Ps),
            "ns" => Ok(TimeUnit::Ns),
            "us" => Ok(TimeUnit::Us),
            "ms" => Ok(TimeUnit::Ms),
            "s" => Ok(TimeUnit::S),
            "dt" => Ok(TimeUnit::Dt),
            other => Err(IrError::UnknownTimeUnit(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_per_unit() {
        assert_eq!(TimeUnit::S.seconds_per_unit(), Some(1.0));
        assert_eq!(TimeUnit::Ns.seconds_per_unit(), Some(1e-9));
        assert_eq!(TimeUnit::Dt.seconds_per_unit(), None);
    }

    #[test]
    fn test_parse_units() {
        assert_eq!("us".parse::<TimeUnit>().unwrap(), TimeUnit::Us);
        assert_eq!("DT".parse::<TimeUnit>().unwrap(), TimeUnit::Dt);
        assert!("fortnight".parse::<TimeUnit>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&TimeUnit::Ms).unwrap();
        assert_eq!(json, "\"ms\"");
        let unit: TimeUnit = serde_json::from_str("\"ps\"").unwrap();
        assert_eq!(unit, TimeUnit::Ps);
    }
}
