use serde::{Deserialize, Serialize};
use std::fmt;

/// A degraded condition absorbed during a pricing run.
///
/// None of these abort the run; they lower confidence and are reported in the
/// signal's explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum PricingWarning {
    StaleData(String),
    EmbeddingFallback(String),
    ReasoningFallback(String),
    BlockchainUnavailable(String),
    MissingSource(String),
}

impl fmt::Display for PricingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingWarning::StaleData(d) => write!(f, "stale data: {d}"),
            PricingWarning::EmbeddingFallback(d) => write!(f, "embedding fallback: {d}"),
            PricingWarning::ReasoningFallback(d) => write!(f, "reasoning fallback: {d}"),
            PricingWarning::BlockchainUnavailable(d) => write!(f, "blockchain unavailable: {d}"),
            PricingWarning::MissingSource(d) => write!(f, "missing source: {d}"),
        }
    }
}
