pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;

use crate::application::assets::AssetUseCase;
use crate::application::data_sources::{DataSourceAck, DataSourceUseCase, SourceStatus};
use crate::application::knowledge_base::KnowledgeBase;
use crate::application::pricing::{EngineConfig, PricingEngine, PricingOptions};
use crate::application::reasoning::LlmReasoningGateway;
use crate::application::stats::{EngineStats, StatsUseCase};
use crate::domain::entities::asset_record::AssetRecord;
use crate::domain::entities::knowledge_entry::ScoredEntry;
use crate::domain::entities::price_signal::PriceSignal;
use crate::domain::error::DomainError;
use crate::domain::ports::asset_repository::AssetRepository;
use crate::domain::ports::chain_verifier::ChainVerifier;
use crate::domain::ports::embedding_port::EmbeddingProvider;
use crate::domain::ports::knowledge_store::KnowledgeStore;
use crate::domain::ports::reasoning_port::Reasoner;
use crate::domain::ports::snapshot_repository::SnapshotRepository;
use crate::infrastructure::blockchain::json_rpc::JsonRpcVerifier;
use crate::infrastructure::cache::snapshot_cache::SnapshotCache;
use crate::infrastructure::embeddings::hashing::HashingEmbedder;
use crate::infrastructure::embeddings::openai::OpenAiProvider;
use crate::infrastructure::llm::chat_completions::ChatCompletionsClient;
use crate::infrastructure::settings::{EmbeddingBackend, Settings};
use crate::infrastructure::sqlite::asset_repo::SqliteAssetRepo;
use crate::infrastructure::sqlite::knowledge_store::SqliteKnowledgeStore;
use crate::infrastructure::sqlite::migrations::open_connection;
use crate::infrastructure::sqlite::snapshot_repo::SqliteSnapshotRepo;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// External collaborators of the engine. Tests swap these for stubs.
pub struct Providers {
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub reasoner: Option<Arc<dyn Reasoner>>,
    pub verifier: Option<Arc<dyn ChainVerifier>>,
}

impl Providers {
    pub fn from_settings(settings: &Settings) -> Self {
        let embedder: Arc<dyn EmbeddingProvider> = match settings.embedding_backend {
            EmbeddingBackend::OpenAi => Arc::new(OpenAiProvider::new(
                settings.embedding_api_key.clone(),
                settings.embedding_model.clone(),
                settings.embedding_dimension,
            )),
            EmbeddingBackend::Hashing => Arc::new(HashingEmbedder::new(settings.embedding_dimension)),
        };

        let reasoner: Option<Arc<dyn Reasoner>> = settings.llm.api_key.as_ref().map(|key| {
            let client = ChatCompletionsClient::new(
                settings.llm.base_url.clone(),
                key.clone(),
                settings.llm.model.clone(),
                settings.llm.temperature,
                settings.llm.max_tokens,
            );
            Arc::new(LlmReasoningGateway::new(Arc::new(client), settings.prompt_budget_chars))
                as Arc<dyn Reasoner>
        });
        if reasoner.is_none() {
            tracing::info!("no LLM API key configured, pricing runs use the deterministic blend");
        }

        let verifier: Option<Arc<dyn ChainVerifier>> = settings
            .eth_rpc_url
            .as_ref()
            .map(|url| Arc::new(JsonRpcVerifier::new(url.clone())) as Arc<dyn ChainVerifier>);

        Self {
            embedder,
            reasoner,
            verifier,
        }
    }
}

pub struct RwaPricing {
    settings: Settings,
    knowledge: Arc<KnowledgeBase>,
    engine: PricingEngine,
    data_sources_uc: DataSourceUseCase,
    assets_uc: AssetUseCase,
    stats_uc: StatsUseCase,
}

impl RwaPricing {
    pub fn new(settings: Settings) -> Result<Self, DomainError> {
        let providers = Providers::from_settings(&settings);
        Self::with_providers(settings, providers)
    }

    /// Opens storage, reloads the data source cache and rebuilds the
    /// knowledge base index before returning.
    pub fn with_providers(settings: Settings, providers: Providers) -> Result<Self, DomainError> {
        let conn1 = open_connection(&settings.db_path)?;
        let conn2 = open_connection(&settings.db_path)?;
        let conn3 = open_connection(&settings.db_path)?;

        let asset_repo: Arc<dyn AssetRepository> = Arc::new(SqliteAssetRepo::new(conn1));
        let snapshot_repo: Arc<dyn SnapshotRepository> = Arc::new(SqliteSnapshotRepo::new(conn2));
        let knowledge_store: Arc<dyn KnowledgeStore> = Arc::new(SqliteKnowledgeStore::new(conn3));

        let cache = Arc::new(SnapshotCache::load(snapshot_repo)?);
        let knowledge = Arc::new(KnowledgeBase::open(
            knowledge_store,
            providers.embedder,
            settings.embed_timeout,
        )?);

        let engine = PricingEngine::new(
            asset_repo.clone(),
            cache.clone(),
            knowledge.clone(),
            providers.reasoner,
            providers.verifier,
            EngineConfig {
                stale_after: settings.stale_after,
                reasoning_timeout: settings.reasoning_timeout,
                chain_timeout: settings.chain_timeout,
                retrieval_k: settings.retrieval_k,
            },
        );

        Ok(Self {
            knowledge: knowledge.clone(),
            engine,
            data_sources_uc: DataSourceUseCase::new(cache.clone(), knowledge.clone()),
            assets_uc: AssetUseCase::new(asset_repo.clone()),
            stats_uc: StatsUseCase::new(asset_repo, cache, knowledge),
            settings,
        })
    }

    pub async fn generate_price(
        &self,
        asset_id: &str,
        price_hint: Option<f64>,
        options: &PricingOptions,
    ) -> Result<PriceSignal, DomainError> {
        self.engine.generate_price(asset_id, price_hint, options).await
    }

    pub async fn update_data_source(
        &self,
        source: &str,
        payload: serde_json::Value,
        timestamp: DateTime<Utc>,
    ) -> Result<DataSourceAck, DomainError> {
        self.data_sources_uc.update(source, payload, timestamp).await
    }

    pub fn sources(&self) -> Vec<SourceStatus> {
        self.data_sources_uc.list(self.settings.stale_after)
    }

    pub fn get_asset(&self, asset_id: &str) -> Result<Option<AssetRecord>, DomainError> {
        self.assets_uc.get(asset_id)
    }

    pub fn register_asset(&self, record: AssetRecord) -> Result<AssetRecord, DomainError> {
        self.assets_uc.register(record)
    }

    pub fn import_assets(&self, json: &str) -> Result<Vec<AssetRecord>, DomainError> {
        self.assets_uc.import(json)
    }

    pub fn list_assets(&self) -> Result<Vec<AssetRecord>, DomainError> {
        self.assets_uc.list()
    }

    pub async fn similar(&self, text: &str, k: usize) -> Result<Vec<ScoredEntry>, DomainError> {
        self.knowledge.query(text, k).await
    }

    pub fn stats(&self) -> Result<EngineStats, DomainError> {
        self.stats_uc.stats(self.settings.stale_after)
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}
