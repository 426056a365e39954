use crate::domain::values::confidence::Confidence;
use crate::domain::values::factor::Factor;
use crate::domain::values::trend::Trend;
use crate::domain::values::warning::PricingWarning;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How one factor moved the price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorContribution {
    pub factor: Factor,
    pub weight: f64,
    /// Normalized delta as a fraction of the baseline.
    pub delta: f64,
    /// `weight * delta`.
    pub contribution: f64,
}

/// The auditable output of one pricing run. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSignal {
    pub id: String,
    pub asset_id: String,
    pub price: f64,
    pub baseline_price: f64,
    pub confidence_score: Confidence,
    /// Factor name → weight; sums to 1.0.
    pub factors: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<Vec<FactorContribution>>,
    pub trend: Trend,
    pub explanation: String,
    pub warnings: Vec<PricingWarning>,
    pub reasoning_used: bool,
    pub generated_at: DateTime<Utc>,
}

impl PriceSignal {
    pub fn weight_of(&self, factor: Factor) -> Option<f64> {
        self.factors.get(factor.name()).copied()
    }

    pub fn weight_sum(&self) -> f64 {
        self.factors.values().sum()
    }
}
