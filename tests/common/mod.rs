//! Shared test helpers.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use rwa_pricing::domain::entities::asset_record::AssetRecord;
use rwa_pricing::domain::entities::knowledge_entry::ScoredEntry;
use rwa_pricing::domain::error::DomainError;
use rwa_pricing::domain::ports::chain_verifier::{ChainVerifier, OnChainRecord};
use rwa_pricing::domain::ports::embedding_port::{EmbeddingProvider, InputType};
use rwa_pricing::domain::ports::reasoning_port::{
    PriceSuggestion, Reasoner, ReasoningOpinion, SnapshotSet,
};
use rwa_pricing::infrastructure::embeddings::hashing::HashingEmbedder;
use rwa_pricing::infrastructure::settings::Settings;
use rwa_pricing::{Providers, RwaPricing};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const DIMENSION: usize = 256;

pub fn settings() -> Settings {
    Settings {
        db_path: ":memory:".into(),
        embedding_dimension: DIMENSION,
        ..Settings::default()
    }
}

pub fn providers(
    reasoner: Option<Arc<dyn Reasoner>>,
    verifier: Option<Arc<dyn ChainVerifier>>,
) -> Providers {
    Providers {
        embedder: Arc::new(HashingEmbedder::new(DIMENSION)),
        reasoner,
        verifier,
    }
}

pub fn setup() -> RwaPricing {
    RwaPricing::with_providers(settings(), providers(None, None)).unwrap()
}

pub fn setup_with(
    reasoner: Option<Arc<dyn Reasoner>>,
    verifier: Option<Arc<dyn ChainVerifier>>,
) -> RwaPricing {
    RwaPricing::with_providers(settings(), providers(reasoner, verifier)).unwrap()
}

/// Always answers with the same opinion.
pub struct StubReasoner {
    pub suggestion: PriceSuggestion,
    pub confidence: f64,
}

impl StubReasoner {
    pub fn absolute(price: f64, confidence: f64) -> Arc<Self> {
        Arc::new(Self {
            suggestion: PriceSuggestion::Absolute(price),
            confidence,
        })
    }
}

#[async_trait]
impl Reasoner for StubReasoner {
    fn name(&self) -> &str {
        "stub"
    }

    async fn evaluate(
        &self,
        _asset: &AssetRecord,
        _snapshots: &SnapshotSet,
        _context: &[ScoredEntry],
    ) -> Result<ReasoningOpinion, DomainError> {
        Ok(ReasoningOpinion {
            suggestion: self.suggestion,
            rationale: "stubbed market view".into(),
            confidence: self.confidence,
            trend: None,
            produced_at: Utc::now(),
        })
    }
}

/// Counts calls and fails every one of them.
#[derive(Default)]
pub struct CountingReasoner {
    pub calls: AtomicUsize,
}

impl CountingReasoner {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Reasoner for CountingReasoner {
    fn name(&self) -> &str {
        "counting"
    }

    async fn evaluate(
        &self,
        _asset: &AssetRecord,
        _snapshots: &SnapshotSet,
        _context: &[ScoredEntry],
    ) -> Result<ReasoningOpinion, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(DomainError::ReasoningUnavailable("counting reasoner never answers".into()))
    }
}

pub struct FailingReasoner;

#[async_trait]
impl Reasoner for FailingReasoner {
    fn name(&self) -> &str {
        "failing"
    }

    async fn evaluate(
        &self,
        _asset: &AssetRecord,
        _snapshots: &SnapshotSet,
        _context: &[ScoredEntry],
    ) -> Result<ReasoningOpinion, DomainError> {
        Err(DomainError::ReasoningUnavailable("connection refused".into()))
    }
}

/// Never answers within any reasonable timeout.
pub struct SlowReasoner;

#[async_trait]
impl Reasoner for SlowReasoner {
    fn name(&self) -> &str {
        "slow"
    }

    async fn evaluate(
        &self,
        _asset: &AssetRecord,
        _snapshots: &SnapshotSet,
        _context: &[ScoredEntry],
    ) -> Result<ReasoningOpinion, DomainError> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        Err(DomainError::ReasoningUnavailable("unreachable".into()))
    }
}

/// Reports the token as found (`Some`) or not found (`None`).
pub struct StubVerifier {
    pub owner: Option<String>,
}

impl StubVerifier {
    pub fn found() -> Arc<Self> {
        Arc::new(Self {
            owner: Some("0x00000000000000000000000000000000000000aa".into()),
        })
    }

    pub fn not_found() -> Arc<Self> {
        Arc::new(Self { owner: None })
    }
}

#[async_trait]
impl ChainVerifier for StubVerifier {
    fn name(&self) -> &str {
        "stub-chain"
    }

    async fn verify(&self, asset: &AssetRecord) -> Result<Option<OnChainRecord>, DomainError> {
        Ok(self.owner.as_ref().map(|owner| OnChainRecord {
            contract_address: asset.contract_address.clone().unwrap_or_default(),
            token_id: asset.token_id.unwrap_or(1),
            owner: owner.clone(),
            name: Some("BoredApeYachtClub".into()),
            symbol: Some("BAYC".into()),
            token_uri: None,
            chain_id: Some(1),
        }))
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _texts: &[String], _input_type: InputType) -> Result<Vec<Vec<f32>>, DomainError> {
        Err(DomainError::Embedding("provider offline".into()))
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }
}
