use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Asset not resolvable: {0}")]
    AssetNotResolvable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Reasoning unavailable: {0}")]
    ReasoningUnavailable(String),

    #[error("Reasoning parse error: {0}")]
    ReasoningParse(String),

    #[error("Blockchain unavailable: {0}")]
    BlockchainUnavailable(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<rusqlite::Error> for DomainError {
    fn from(e: rusqlite::Error) -> Self {
        DomainError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Parse(e.to_string())
    }
}

impl From<&str> for DomainError {
    fn from(s: &str) -> Self {
        DomainError::InvalidInput(s.to_string())
    }
}
