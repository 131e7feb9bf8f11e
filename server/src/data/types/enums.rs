//! Classification enums for collectd data
//!
//! Shared between the catalog, the wire decoder and the metrics pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// DATA SOURCE KIND
// ============================================================================

/// Kind of a collectd data source
///
/// Gauges are instantaneous values. Counters and derives are cumulative and
/// are usually converted to rates before being stored. Absolute values are
/// accepted but not mapped to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    #[default]
    Gauge,
    Counter,
    Derive,
    Absolute,
}

impl DataKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gauge => "gauge",
            Self::Counter => "counter",
            Self::Derive => "derive",
            Self::Absolute => "absolute",
        }
    }

    /// Map a collectd wire type code to a kind
    pub fn from_wire(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Counter),
            1 => Some(Self::Gauge),
            2 => Some(Self::Derive),
            3 => Some(Self::Absolute),
            _ => None,
        }
    }

    /// Whether samples of this kind are cumulative
    pub fn is_cumulative(&self) -> bool {
        matches!(self, Self::Counter | Self::Derive)
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataKind {
    type Err = String;

    /// Parse a `types.db` kind (`GAUGE`, `COUNTER`, ...), case-insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gauge" => Ok(Self::Gauge),
            "counter" => Ok(Self::Counter),
            "derive" => Ok(Self::Derive),
            "absolute" => Ok(Self::Absolute),
            _ => Err(format!(
                "Invalid data source kind '{}'. Valid options: GAUGE, COUNTER, DERIVE, ABSOLUTE",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_wire_codes() {
        assert_eq!(DataKind::from_wire(0), Some(DataKind::Counter));
        assert_eq!(DataKind::from_wire(1), Some(DataKind::Gauge));
        assert_eq!(DataKind::from_wire(2), Some(DataKind::Derive));
        assert_eq!(DataKind::from_wire(3), Some(DataKind::Absolute));
        assert_eq!(DataKind::from_wire(4), None);
    }

    #[test]
    fn test_from_str_case_insensitive() {
        assert_eq!("DERIVE".parse::<DataKind>().unwrap(), DataKind::Derive);
        assert_eq!("gauge".parse::<DataKind>().unwrap(), DataKind::Gauge);
        assert!("HISTOGRAM".parse::<DataKind>().is_err());
    }

    #[test]
    fn test_is_cumulative() {
        assert!(DataKind::Counter.is_cumulative());
        assert!(DataKind::Derive.is_cumulative());
        assert!(!DataKind::Gauge.is_cumulative());
        assert!(!DataKind::Absolute.is_cumulative());
    }
}
