use crate::domain::entities::asset_record::AssetRecord;
use crate::domain::error::DomainError;
use async_trait::async_trait;
use serde::Serialize;

/// Ownership and metadata read from the token contract. Metadata calls are
/// optional on ERC-721, so each of those fields is `None` when the contract
/// does not answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OnChainRecord {
    pub contract_address: String,
    pub token_id: u64,
    pub owner: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub token_uri: Option<String>,
    pub chain_id: Option<u64>,
}

impl OnChainRecord {
    pub fn describe(&self) -> String {
        let unknown = "Unknown";
        format!(
            "{} ({}) token {} owned by {} on chain {}{}",
            self.name.as_deref().unwrap_or(unknown),
            self.symbol.as_deref().unwrap_or(unknown),
            self.token_id,
            self.owner,
            self.chain_id.map(|id| id.to_string()).as_deref().unwrap_or(unknown),
            self.token_uri
                .as_deref()
                .map(|uri| format!(", metadata at {uri}"))
                .unwrap_or_default(),
        )
    }
}

/// Blockchain verification backend.
///
/// `Ok(None)` means the token does not exist on chain. Every `Err` is treated
/// by the engine as "blockchain factor unavailable".
#[async_trait]
pub trait ChainVerifier: Send + Sync {
    fn name(&self) -> &str;

    async fn verify(&self, asset: &AssetRecord) -> Result<Option<OnChainRecord>, DomainError>;
}
