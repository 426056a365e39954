//! Pricing decision engine.
//!
//! One call to [`PricingEngine::generate_price`] produces one immutable
//! [`PriceSignal`]. Only a malformed asset id fails the call; every other
//! problem (missing or stale snapshots, embedding, reasoning or chain
//! failures, storage hiccups) is absorbed into warnings and a lower
//! confidence score.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::application::knowledge_base::KnowledgeBase;
use crate::domain::entities::asset_record::AssetRecord;
use crate::domain::entities::knowledge_entry::ScoredEntry;
use crate::domain::entities::price_signal::{FactorContribution, PriceSignal};
use crate::domain::entities::snapshot::sources;
use crate::domain::error::DomainError;
use crate::domain::ports::asset_repository::AssetRepository;
use crate::domain::ports::chain_verifier::{ChainVerifier, OnChainRecord};
use crate::domain::ports::reasoning_port::{PriceSuggestion, Reasoner, ReasoningOpinion, SnapshotSet};
use crate::domain::values::confidence::{self, ConfidenceInputs};
use crate::domain::values::factor::{redistribute, Factor};
use crate::domain::values::freshness::{is_stale, mean_freshness};
use crate::domain::values::normalize;
use crate::domain::values::trend::Trend;
use crate::domain::values::warning::PricingWarning;
use crate::infrastructure::cache::snapshot_cache::SnapshotCache;

/// Prices never go below one cent.
pub const MIN_PRICE: f64 = 0.01;
/// Baseline used when neither the caller, the asset record, the market nor
/// the reasoning step supplies one.
pub const DEFAULT_BASELINE: f64 = 10_000.0;

/// Factors used with zero deltas when nothing else is active.
const NEUTRAL_FACTORS: [Factor; 3] = [
    Factor::SentimentAnalysis,
    Factor::EconomicIndicators,
    Factor::AssetIntrinsicValue,
];

#[derive(Debug, Clone, Copy)]
pub struct PricingOptions {
    /// Call the reasoning gateway.
    pub use_llm: bool,
    /// Verify ownership on chain and weight the blockchain factor.
    pub verify_on_chain: bool,
    /// Expose the full factor breakdown in the signal and its explanation.
    pub include_factors: bool,
}

impl Default for PricingOptions {
    fn default() -> Self {
        Self {
            use_llm: true,
            verify_on_chain: false,
            include_factors: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub stale_after: chrono::Duration,
    pub reasoning_timeout: Duration,
    pub chain_timeout: Duration,
    pub retrieval_k: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stale_after: chrono::Duration::hours(24),
            reasoning_timeout: Duration::from_secs(30),
            chain_timeout: Duration::from_secs(10),
            retrieval_k: 5,
        }
    }
}

/// Result of weighting a set of factor deltas.
#[derive(Debug, Clone)]
pub struct Blend {
    pub price: f64,
    pub contributions: Vec<FactorContribution>,
}

impl Blend {
    pub fn weights(&self) -> BTreeMap<String, f64> {
        self.contributions
            .iter()
            .map(|c| (c.factor.name().to_string(), c.weight))
            .collect()
    }
}

/// Applies the canonical weight table to `deltas` around `baseline`.
///
/// An empty `deltas` falls back to the neutral factors, so the returned
/// weights always sum to one.
pub fn blend(baseline: f64, deltas: &BTreeMap<Factor, f64>) -> Blend {
    let neutral: BTreeMap<Factor, f64>;
    let deltas = if deltas.is_empty() {
        neutral = NEUTRAL_FACTORS.iter().map(|f| (*f, 0.0)).collect();
        &neutral
    } else {
        deltas
    };
    let active: Vec<Factor> = deltas.keys().copied().collect();
    let weights = redistribute(&active);

    let contributions: Vec<FactorContribution> = weights
        .iter()
        .map(|(factor, weight)| {
            let delta = deltas.get(factor).copied().unwrap_or(0.0);
            FactorContribution {
                factor: *factor,
                weight: *weight,
                delta,
                contribution: weight * delta,
            }
        })
        .collect();
    let adjustment: f64 = contributions.iter().map(|c| c.contribution).sum();
    let raw = baseline * (1.0 + adjustment);
    let price = ((raw * 100.0).round() / 100.0).max(MIN_PRICE);

    Blend { price, contributions }
}

pub struct PricingEngine {
    assets: Arc<dyn AssetRepository>,
    cache: Arc<SnapshotCache>,
    knowledge: Arc<KnowledgeBase>,
    reasoner: Option<Arc<dyn Reasoner>>,
    verifier: Option<Arc<dyn ChainVerifier>>,
    config: EngineConfig,
}

/// Outcome of the optional on-chain check.
enum Verification {
    NotRequested,
    Verified(OnChainRecord),
    Failed,
}

impl Verification {
    fn record(&self) -> Option<&OnChainRecord> {
        match self {
            Verification::Verified(record) => Some(record),
            _ => None,
        }
    }
}

impl PricingEngine {
    pub fn new(
        assets: Arc<dyn AssetRepository>,
        cache: Arc<SnapshotCache>,
        knowledge: Arc<KnowledgeBase>,
        reasoner: Option<Arc<dyn Reasoner>>,
        verifier: Option<Arc<dyn ChainVerifier>>,
        config: EngineConfig,
    ) -> Self {
        Self {
            assets,
            cache,
            knowledge,
            reasoner,
            verifier,
            config,
        }
    }

    pub async fn generate_price(
        &self,
        asset_id: &str,
        price_hint: Option<f64>,
        options: &PricingOptions,
    ) -> Result<PriceSignal, DomainError> {
        let asset_id = AssetRecord::validate_id(asset_id)?;
        let hint = price_hint.filter(|p| p.is_finite() && *p > 0.0);
        let now = Utc::now();
        let mut warnings = Vec::new();

        let (asset, recorded_price) = self.resolve_asset(asset_id, hint);

        let snapshots = self.cache.latest(&sources::ALL);
        for source in sources::ALL {
            match snapshots.get(source) {
                None => warnings.push(PricingWarning::MissingSource(source.to_string())),
                Some(snap) if is_stale(&snap.timestamp, self.config.stale_after, &now) => {
                    let age_hours = (now - snap.timestamp).num_hours();
                    tracing::warn!(source, age_hours, "using stale snapshot");
                    warnings.push(PricingWarning::StaleData(format!(
                        "{source} snapshot is {age_hours}h old"
                    )));
                }
                Some(_) => {}
            }
        }
        let freshness = mean_freshness(
            snapshots.values().map(|s| &s.timestamp),
            self.config.stale_after,
            &now,
        );

        let summaries: Vec<String> = snapshots.values().map(|s| s.summary()).collect();
        let context = self.retrieve_context(&asset, &summaries, &mut warnings).await;

        let opinion = if options.use_llm {
            self.consult_reasoner(&asset, &snapshots, &context, &mut warnings).await
        } else {
            None
        };

        let market_comparables: Vec<f64> = [sources::MARKET_DATA, sources::AUCTION_DATA]
            .iter()
            .filter_map(|s| snapshots.get(*s))
            .filter_map(|s| normalize::comparable_price(&s.payload))
            .collect();
        let baseline = hint
            .or(recorded_price)
            .or_else(|| market_comparables.first().copied())
            .or_else(|| match opinion.as_ref().map(|o| o.suggestion) {
                Some(PriceSuggestion::Absolute(p)) => Some(p),
                _ => None,
            })
            .unwrap_or(DEFAULT_BASELINE);

        let verification = if options.verify_on_chain {
            self.verify_on_chain(&asset, &mut warnings).await
        } else {
            Verification::NotRequested
        };

        let mut deltas: BTreeMap<Factor, f64> = BTreeMap::new();
        if let Some(op) = &opinion {
            let delta = match op.suggestion {
                PriceSuggestion::Absolute(p) => normalize::relative_gap(p, baseline),
                PriceSuggestion::ChangePct(pct) => normalize::percent_delta(pct),
            };
            if let Some(d) = delta {
                deltas.insert(Factor::RecentMarketData, d);
            }
        }
        if let Some(d) = snapshots
            .get(sources::SENTIMENT)
            .and_then(|s| normalize::sentiment_delta(&s.payload))
        {
            deltas.insert(Factor::SentimentAnalysis, d);
        }
        if let Some(d) = snapshots
            .get(sources::ECONOMIC_INDICATORS)
            .and_then(|s| normalize::economic_delta(&s.payload))
        {
            deltas.insert(Factor::EconomicIndicators, d);
        }
        if matches!(verification, Verification::Verified(_)) {
            deltas.insert(Factor::BlockchainData, normalize::PROVENANCE_PREMIUM);
        }
        let mut estimates = market_comparables;
        // The recorded price only counts as independent evidence when it is
        // not already the baseline.
        if hint.is_some() {
            estimates.extend(recorded_price);
        }
        if let Some(d) = normalize::intrinsic_delta(&estimates, baseline) {
            deltas.insert(Factor::AssetIntrinsicValue, d);
        }

        let active_factors = deltas.len();
        let blended = blend(baseline, &deltas);
        let price = blended.price;
        let trend = Trend::between(baseline, price);
        let confidence_score = confidence::score(&ConfidenceInputs {
            reasoning: opinion.as_ref().map(|o| o.confidence),
            active_factors,
            freshness,
            verification_failed: matches!(verification, Verification::Failed),
        });

        let signal_id = Uuid::new_v4().to_string();
        let mut evidence = format!(
            "Price signal for {asset_id}: price {price:.2} (baseline {baseline:.2}, trend {trend}, confidence {confidence_score}). Evidence: {}",
            if summaries.is_empty() { "none".to_string() } else { summaries.join("; ") }
        );
        if let Some(record) = verification.record() {
            evidence.push_str(". On chain: ");
            evidence.push_str(&record.describe());
        }
        let metadata = json!({
            "asset_id": asset_id,
            "source": "price_signal",
            "timestamp": now.to_rfc3339(),
            "signal_id": signal_id,
        });
        match self.knowledge.insert(&evidence, metadata).await {
            Ok(receipt) => {
                if let Some(err) = receipt.embedding_error {
                    warnings.push(PricingWarning::EmbeddingFallback(format!(
                        "evidence stored without embedding: {err}"
                    )));
                }
            }
            Err(e) => tracing::warn!(error = %e, asset_id, "failed to record evidence in knowledge base"),
        }

        if let Err(e) = self.assets.upsert(&asset.repriced(price, now)) {
            tracing::warn!(error = %e, asset_id, "failed to persist repriced asset");
        }

        let breakdown = options.include_factors.then(|| blended.contributions.clone());
        let explanation = explain(
            asset_id,
            baseline,
            price,
            opinion.as_ref(),
            verification.record(),
            options.include_factors.then_some(&blended.contributions[..]),
            &warnings,
        );

        let signal = PriceSignal {
            id: signal_id,
            asset_id: asset_id.to_string(),
            price,
            baseline_price: baseline,
            confidence_score,
            factors: blended.weights(),
            breakdown,
            trend,
            explanation,
            warnings,
            reasoning_used: opinion.is_some(),
            generated_at: now,
        };

        tracing::info!(
            asset_id,
            price = signal.price,
            confidence = signal.confidence_score.value(),
            trend = %signal.trend,
            active_factors,
            reasoning_used = signal.reasoning_used,
            "price signal generated"
        );
        Ok(signal)
    }

    /// Returns the asset and its previously recorded price. Unknown assets,
    /// and lookups that fail, yield a placeholder that is created on upsert.
    fn resolve_asset(&self, asset_id: &str, hint: Option<f64>) -> (AssetRecord, Option<f64>) {
        match self.assets.get(asset_id) {
            Ok(Some(record)) => {
                let recorded = record.last_price.filter(|p| *p > 0.0);
                (record, recorded)
            }
            Ok(None) => (AssetRecord::placeholder(asset_id, hint), None),
            Err(e) => {
                tracing::warn!(error = %e, asset_id, "asset lookup failed, pricing as new asset");
                (AssetRecord::placeholder(asset_id, hint), None)
            }
        }
    }

    async fn retrieve_context(
        &self,
        asset: &AssetRecord,
        summaries: &[String],
        warnings: &mut Vec<PricingWarning>,
    ) -> Vec<ScoredEntry> {
        let mut query = asset.searchable_text();
        for summary in summaries {
            query.push_str(" | ");
            query.push_str(summary);
        }
        match self.knowledge.query(&query, self.config.retrieval_k).await {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!(error = %e, asset_id = %asset.id, "context retrieval failed, continuing without history");
                warnings.push(PricingWarning::EmbeddingFallback(e.to_string()));
                vec![]
            }
        }
    }

    async fn consult_reasoner(
        &self,
        asset: &AssetRecord,
        snapshots: &SnapshotSet,
        context: &[ScoredEntry],
        warnings: &mut Vec<PricingWarning>,
    ) -> Option<ReasoningOpinion> {
        let Some(reasoner) = &self.reasoner else {
            warnings.push(PricingWarning::ReasoningFallback(
                "no reasoning backend configured".into(),
            ));
            return None;
        };
        let outcome = tokio::time::timeout(
            self.config.reasoning_timeout,
            reasoner.evaluate(asset, snapshots, context),
        )
        .await
        .unwrap_or_else(|_| {
            Err(DomainError::ReasoningUnavailable(format!(
                "{} timed out after {:?}",
                reasoner.name(),
                self.config.reasoning_timeout
            )))
        });
        match outcome {
            Ok(opinion) => Some(opinion),
            Err(e) => {
                tracing::warn!(error = %e, asset_id = %asset.id, reasoner = reasoner.name(), "reasoning failed, using deterministic blend");
                warnings.push(PricingWarning::ReasoningFallback(e.to_string()));
                None
            }
        }
    }

    async fn verify_on_chain(
        &self,
        asset: &AssetRecord,
        warnings: &mut Vec<PricingWarning>,
    ) -> Verification {
        let Some(verifier) = &self.verifier else {
            warnings.push(PricingWarning::BlockchainUnavailable(
                "no blockchain backend configured".into(),
            ));
            return Verification::Failed;
        };
        let outcome = tokio::time::timeout(self.config.chain_timeout, verifier.verify(asset))
            .await
            .unwrap_or_else(|_| {
                Err(DomainError::BlockchainUnavailable(format!(
                    "{} timed out after {:?}",
                    verifier.name(),
                    self.config.chain_timeout
                )))
            });
        match outcome {
            Ok(Some(record)) => {
                tracing::debug!(asset_id = %asset.id, owner = %record.owner, chain_id = ?record.chain_id, "ownership verified on chain");
                Verification::Verified(record)
            }
            Ok(None) => {
                tracing::warn!(asset_id = %asset.id, "token not found on chain");
                warnings.push(PricingWarning::BlockchainUnavailable(format!(
                    "token for {} not found on chain",
                    asset.id
                )));
                Verification::Failed
            }
            Err(e) => {
                tracing::warn!(error = %e, asset_id = %asset.id, "blockchain verification failed");
                warnings.push(PricingWarning::BlockchainUnavailable(e.to_string()));
                Verification::Failed
            }
        }
    }
}

fn explain(
    asset_id: &str,
    baseline: f64,
    price: f64,
    opinion: Option<&ReasoningOpinion>,
    chain: Option<&OnChainRecord>,
    breakdown: Option<&[FactorContribution]>,
    warnings: &[PricingWarning],
) -> String {
    let change = (price - baseline) / baseline * 100.0;
    let mut text = format!(
        "{asset_id} priced at {price:.2} against a baseline of {baseline:.2} ({change:+.2}%)."
    );
    match opinion {
        Some(op) if !op.rationale.is_empty() => {
            text.push_str(" Reasoning: ");
            text.push_str(&op.rationale);
        }
        Some(_) => text.push_str(" Reasoning opinion included without rationale."),
        None => text.push_str(" Deterministic blend without a reasoning opinion."),
    }
    if let Some(record) = chain {
        text.push_str(" Verified on chain: ");
        text.push_str(&record.describe());
        text.push('.');
    }
    if let Some(contributions) = breakdown {
        let parts: Vec<String> = contributions
            .iter()
            .map(|c| {
                format!(
                    "{} weight {:.3} delta {:+.4} contribution {:+.4}",
                    c.factor, c.weight, c.delta, c.contribution
                )
            })
            .collect();
        text.push_str(" Factors: ");
        text.push_str(&parts.join("; "));
        text.push('.');
    }
    if !warnings.is_empty() {
        let parts: Vec<String> = warnings.iter().map(|w| w.to_string()).collect();
        text.push_str(" Warnings: ");
        text.push_str(&parts.join("; "));
        text.push('.');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::values::factor::WEIGHT_EPSILON;

    #[test]
    fn test_blend_without_deltas_uses_neutral_factors() {
        let b = blend(120_000.0, &BTreeMap::new());
        assert_eq!(b.price, 120_000.0);
        assert_eq!(b.contributions.len(), 3);
        let sum: f64 = b.weights().values().sum();
        assert!((sum - 1.0).abs() < WEIGHT_EPSILON);
        assert!(!b.weights().contains_key("recent_market_data"));
    }

    #[test]
    fn test_blend_redistributes_missing_weight() {
        let mut deltas = BTreeMap::new();
        deltas.insert(Factor::SentimentAnalysis, 0.1);
        deltas.insert(Factor::AssetIntrinsicValue, -0.1);
        let b = blend(100.0, &deltas);
        let w = b.weights();
        assert!((w["sentiment_analysis"] - 2.0 / 3.0).abs() < 1e-9);
        assert!((w["asset_intrinsic_value"] - 1.0 / 3.0).abs() < 1e-9);
        // 100 * (1 + 0.1 * 2/3 - 0.1 * 1/3)
        assert!((b.price - 103.33).abs() < 1e-9);
    }

    #[test]
    fn test_blend_price_is_floored() {
        let mut deltas = BTreeMap::new();
        deltas.insert(Factor::RecentMarketData, -0.5);
        assert_eq!(blend(0.01, &deltas).price, MIN_PRICE);
    }

    #[test]
    fn test_explanation_lists_factors_and_warnings() {
        let mut deltas = BTreeMap::new();
        deltas.insert(Factor::EconomicIndicators, 0.02);
        let b = blend(1000.0, &deltas);
        let text = explain(
            "asset",
            1000.0,
            b.price,
            None,
            None,
            Some(&b.contributions),
            &[PricingWarning::MissingSource("sentiment".into())],
        );
        assert!(text.contains("economic_indicators weight 1.000"));
        assert!(text.contains("missing source: sentiment"));
        assert!(text.contains("Deterministic blend"));
    }

    #[test]
    fn test_explanation_describes_chain_record() {
        let record = OnChainRecord {
            contract_address: "0xbc4ca0eda7647a8ab7c2061c2e118a18a936f13d".into(),
            token_id: 1234,
            owner: "0x00000000000000000000000000000000000000aa".into(),
            name: Some("BoredApeYachtClub".into()),
            symbol: None,
            token_uri: None,
            chain_id: Some(1),
        };
        let text = explain("bored_ape_1234", 100.0, 102.0, None, Some(&record), None, &[]);
        assert!(text.contains("BoredApeYachtClub (Unknown) token 1234"));
        assert!(text.contains("on chain 1"));
    }
}
