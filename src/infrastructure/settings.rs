use std::time::Duration;

use crate::domain::error::DomainError;
use crate::infrastructure::embeddings::hashing::DEFAULT_DIMENSION;
use crate::infrastructure::llm::chat_completions::{DEFAULT_BASE_URL, DEFAULT_MODEL};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    Hashing,
    OpenAi,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: usize,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub db_path: String,
    pub embedding_backend: EmbeddingBackend,
    pub embedding_api_key: String,
    pub embedding_model: Option<String>,
    pub embedding_dimension: usize,
    pub llm: LlmSettings,
    pub eth_rpc_url: Option<String>,
    /// Snapshots older than this are flagged stale.
    pub stale_after: chrono::Duration,
    pub embed_timeout: Duration,
    pub reasoning_timeout: Duration,
    pub chain_timeout: Duration,
    pub retrieval_k: usize,
    /// Character budget for the reasoning prompt's historical context.
    pub prompt_budget_chars: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: "./rwa_pricing.db".into(),
            embedding_backend: EmbeddingBackend::Hashing,
            embedding_api_key: String::new(),
            embedding_model: None,
            embedding_dimension: DEFAULT_DIMENSION,
            llm: LlmSettings {
                base_url: DEFAULT_BASE_URL.into(),
                api_key: None,
                model: DEFAULT_MODEL.into(),
                temperature: 0.1,
                max_tokens: 1000,
            },
            eth_rpc_url: None,
            stale_after: chrono::Duration::hours(24),
            embed_timeout: Duration::from_secs(5),
            reasoning_timeout: Duration::from_secs(30),
            chain_timeout: Duration::from_secs(10),
            retrieval_k: 5,
            prompt_budget_chars: 6000,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Settings::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let embedding_backend = match get("RWA_EMBEDDING_PROVIDER").as_deref() {
            None | Some("hashing") | Some("local") => EmbeddingBackend::Hashing,
            Some("openai") => EmbeddingBackend::OpenAi,
            Some(other) => {
                return Err(DomainError::Config(format!("unknown embedding provider: {other}")))
            }
        };

        Ok(Self {
            db_path: get("RWA_DB").unwrap_or(d.db_path),
            embedding_backend,
            embedding_api_key: get("RWA_EMBEDDING_API_KEY").unwrap_or_default(),
            embedding_model: get("RWA_EMBEDDING_MODEL"),
            embedding_dimension: parse(&get, "RWA_EMBEDDING_DIMENSION", d.embedding_dimension)?,
            llm: LlmSettings {
                base_url: get("RWA_LLM_BASE_URL").unwrap_or(d.llm.base_url),
                api_key: get("RWA_LLM_API_KEY").or_else(|| get("GROQ_API_KEY")),
                model: get("RWA_LLM_MODEL").unwrap_or(d.llm.model),
                temperature: parse(&get, "RWA_LLM_TEMPERATURE", d.llm.temperature)?,
                max_tokens: parse(&get, "RWA_LLM_MAX_TOKENS", d.llm.max_tokens)?,
            },
            eth_rpc_url: get("RWA_ETH_RPC_URL").or_else(|| get("INFURA_ENDPOINT")),
            stale_after: chrono::Duration::seconds(parse(
                &get,
                "RWA_STALE_AFTER_SECS",
                d.stale_after.num_seconds(),
            )?),
            embed_timeout: Duration::from_millis(parse(&get, "RWA_EMBED_TIMEOUT_MS", 5_000)?),
            reasoning_timeout: Duration::from_millis(parse(&get, "RWA_REASONING_TIMEOUT_MS", 30_000)?),
            chain_timeout: Duration::from_millis(parse(&get, "RWA_CHAIN_TIMEOUT_MS", 10_000)?),
            retrieval_k: parse(&get, "RWA_RETRIEVAL_K", d.retrieval_k)?,
            prompt_budget_chars: parse(&get, "RWA_PROMPT_BUDGET_CHARS", d.prompt_budget_chars)?,
        })
    }
}

fn parse<T, G>(get: &G, key: &str, default: T) -> Result<T, DomainError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|e| DomainError::Config(format!("{key}={raw}: {e}"))),
    }
}
