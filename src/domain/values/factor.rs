use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Tolerance used when checking that weights sum to one.
pub const WEIGHT_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    /// Market evidence as interpreted by the reasoning gateway.
    RecentMarketData,
    SentimentAnalysis,
    EconomicIndicators,
    BlockchainData,
    AssetIntrinsicValue,
}

impl Factor {
    pub const ALL: [Factor; 5] = [
        Factor::RecentMarketData,
        Factor::SentimentAnalysis,
        Factor::EconomicIndicators,
        Factor::BlockchainData,
        Factor::AssetIntrinsicValue,
    ];

    pub fn canonical_weight(&self) -> f64 {
        match self {
            Factor::RecentMarketData => 0.4,
            Factor::SentimentAnalysis => 0.2,
            Factor::EconomicIndicators => 0.1,
            Factor::BlockchainData => 0.2,
            Factor::AssetIntrinsicValue => 0.1,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Factor::RecentMarketData => "recent_market_data",
            Factor::SentimentAnalysis => "sentiment_analysis",
            Factor::EconomicIndicators => "economic_indicators",
            Factor::BlockchainData => "blockchain_data",
            Factor::AssetIntrinsicValue => "asset_intrinsic_value",
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Weights for `active`, renormalized to sum to 1.0.
///
/// Duplicates are ignored. An empty slice yields an empty map; callers decide
/// which neutral factors to fall back on.
pub fn redistribute(active: &[Factor]) -> BTreeMap<Factor, f64> {
    let mut weights: BTreeMap<Factor, f64> = BTreeMap::new();
    for factor in active {
        weights.insert(*factor, factor.canonical_weight());
    }
    let total: f64 = weights.values().sum();
    if total <= 0.0 {
        return BTreeMap::new();
    }
    for w in weights.values_mut() {
        *w /= total;
    }
    weights
}
