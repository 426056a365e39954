use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Relative move below which a price is considered unchanged (0.5%).
pub const STABLE_TOLERANCE: f64 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl Trend {
    /// Classify `price` against `baseline` using [`STABLE_TOLERANCE`].
    pub fn between(baseline: f64, price: f64) -> Self {
        if baseline <= 0.0 {
            return Trend::Stable;
        }
        let change = (price - baseline) / baseline;
        if change > STABLE_TOLERANCE {
            Trend::Up
        } else if change < -STABLE_TOLERANCE {
            Trend::Down
        } else {
            Trend::Stable
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Up => write!(f, "up"),
            Trend::Down => write!(f, "down"),
            Trend::Stable => write!(f, "stable"),
        }
    }
}

impl FromStr for Trend {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" => Ok(Trend::Up),
            "down" => Ok(Trend::Down),
            "stable" => Ok(Trend::Stable),
            _ => Err(format!("Unknown trend: {s}")),
        }
    }
}
