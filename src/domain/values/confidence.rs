//! Confidence values and the signal confidence score.
//!
//! `score = (0.6 * reasoning + 0.4 * coverage) * freshness * verification`
//! where `coverage` is the share of canonical factors that were active and
//! `reasoning` is `0.35 + 0.65 * opinion_confidence` (0.35 without an opinion).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::values::factor::Factor;

const REASONING_WEIGHT: f64 = 0.6;
const COVERAGE_WEIGHT: f64 = 0.4;

/// Reasoning term when no opinion was obtained. An opinion's term starts
/// here and rises with its self-reported confidence, so a run with an opinion
/// never scores below the same run without one.
pub const FALLBACK_REASONING_CONFIDENCE: f64 = 0.35;

/// Multiplier applied when on-chain verification was requested but failed.
pub const VERIFICATION_FAILURE_PENALTY: f64 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Confidence(f64);

impl Confidence {
    /// Clamp into [0, 1]; NaN becomes 0.
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            return Confidence(0.0);
        }
        Confidence(value.clamp(0.0, 1.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Evidence quality observed during one pricing run.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceInputs {
    /// Self-reported confidence of the reasoning opinion, if one was obtained.
    pub reasoning: Option<f64>,
    pub active_factors: usize,
    /// Mean snapshot freshness in [0, 1].
    pub freshness: f64,
    pub verification_failed: bool,
}

pub fn score(inputs: &ConfidenceInputs) -> Confidence {
    let reasoning = inputs
        .reasoning
        .map(|c| {
            let c = if c.is_nan() { 0.0 } else { c.clamp(0.0, 1.0) };
            FALLBACK_REASONING_CONFIDENCE + (1.0 - FALLBACK_REASONING_CONFIDENCE) * c
        })
        .unwrap_or(FALLBACK_REASONING_CONFIDENCE);
    let coverage = (inputs.active_factors as f64 / Factor::ALL.len() as f64).min(1.0);
    let mut value = (REASONING_WEIGHT * reasoning + COVERAGE_WEIGHT * coverage)
        * inputs.freshness.clamp(0.0, 1.0);
    if inputs.verification_failed {
        value *= VERIFICATION_FAILURE_PENALTY;
    }
    Confidence::clamped(value)
}
