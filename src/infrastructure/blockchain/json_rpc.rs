use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::entities::asset_record::AssetRecord;
use crate::domain::error::DomainError;
use crate::domain::ports::chain_verifier::{ChainVerifier, OnChainRecord};

/// `keccak256("ownerOf(uint256)")[..4]`
const OWNER_OF_SELECTOR: &str = "6352211e";
/// `keccak256("tokenURI(uint256)")[..4]`
const TOKEN_URI_SELECTOR: &str = "c87b56dd";
/// `keccak256("name()")[..4]`
const NAME_SELECTOR: &str = "0x06fdde03";
/// `keccak256("symbol()")[..4]`
const SYMBOL_SELECTOR: &str = "0x95d89b41";
/// Token checked when the asset record does not name one.
const DEFAULT_TOKEN_ID: u64 = 1;
/// Upper bound on a decoded ABI string, in bytes.
const MAX_ABI_STRING: usize = 4096;

pub struct JsonRpcVerifier {
    client: Client,
    rpc_url: String,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    message: String,
}

impl JsonRpcVerifier {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            rpc_url: rpc_url.into(),
        }
    }

    /// One JSON-RPC round trip. A revert comes back as `Ok(None)`.
    async fn rpc(&self, method: &str, params: Value) -> Result<Option<String>, DomainError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let resp = self
            .client
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::BlockchainUnavailable(format!("RPC request failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(DomainError::BlockchainUnavailable(format!("RPC status {}", resp.status())));
        }
        let parsed: RpcResponse = resp
            .json()
            .await
            .map_err(|e| DomainError::BlockchainUnavailable(format!("Malformed RPC response: {e}")))?;

        if let Some(err) = parsed.error {
            if err.message.to_lowercase().contains("revert") {
                return Ok(None);
            }
            return Err(DomainError::BlockchainUnavailable(err.message));
        }
        Ok(parsed.result)
    }

    async fn eth_call(&self, to: &str, data: &str) -> Result<Option<String>, DomainError> {
        self.rpc("eth_call", json!([{"to": to, "data": data}, "latest"])).await
    }

    /// Reads an optional string getter; any failure leaves the field empty.
    async fn read_string(&self, contract: &str, data: &str) -> Option<String> {
        match self.eth_call(contract, data).await {
            Ok(result) => result.as_deref().and_then(decode_abi_string),
            Err(e) => {
                tracing::debug!(error = %e, contract, data, "metadata call failed");
                None
            }
        }
    }

    async fn chain_id(&self) -> Option<u64> {
        match self.rpc("eth_chainId", json!([])).await {
            Ok(result) => result.as_deref().and_then(decode_quantity),
            Err(e) => {
                tracing::debug!(error = %e, "eth_chainId failed");
                None
            }
        }
    }
}

pub fn is_valid_address(address: &str) -> bool {
    address
        .strip_prefix("0x")
        .map(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false)
}

fn encode_token_call(selector: &str, token_id: u64) -> String {
    format!("0x{selector}{token_id:064x}")
}

pub fn encode_owner_of(token_id: u64) -> String {
    encode_token_call(OWNER_OF_SELECTOR, token_id)
}

pub fn encode_token_uri(token_id: u64) -> String {
    encode_token_call(TOKEN_URI_SELECTOR, token_id)
}

/// Extracts the address from a 32-byte ABI word; `None` for empty, zero or
/// non-hex input.
pub fn decode_address(result: &str) -> Option<String> {
    let hex = result.strip_prefix("0x").unwrap_or(result);
    if hex.len() < 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let addr = &hex[hex.len() - 40..];
    if addr.chars().all(|c| c == '0') {
        return None;
    }
    Some(format!("0x{}", addr.to_lowercase()))
}

/// Parses a hex quantity such as `"0x1"`.
pub fn decode_quantity(result: &str) -> Option<u64> {
    let hex = result.strip_prefix("0x").unwrap_or(result);
    if hex.is_empty() {
        return None;
    }
    u64::from_str_radix(hex, 16).ok()
}

fn hex_bytes(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}

/// Reads a big-endian 32-byte word as a length or offset.
fn word_to_usize(word: &[u8]) -> Option<usize> {
    let (high, low) = word.split_at(24);
    if high.iter().any(|b| *b != 0) {
        return None;
    }
    let value = low.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
    usize::try_from(value).ok()
}

/// Decodes an ABI-encoded dynamic `string` return value. Contracts that
/// return a `bytes32` instead are read as a NUL-padded string.
pub fn decode_abi_string(result: &str) -> Option<String> {
    let bytes = hex_bytes(result.strip_prefix("0x").unwrap_or(result))?;
    let raw: &[u8] = if bytes.len() == 32 {
        &bytes
    } else {
        let offset = word_to_usize(bytes.get(..32)?)?;
        let len = word_to_usize(bytes.get(offset..offset.checked_add(32)?)?)?;
        if len > MAX_ABI_STRING {
            return None;
        }
        let start = offset + 32;
        bytes.get(start..start.checked_add(len)?)?
    };
    let text = String::from_utf8(raw.to_vec()).ok()?;
    let text = text.trim_end_matches('\0').trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[async_trait]
impl ChainVerifier for JsonRpcVerifier {
    fn name(&self) -> &str {
        "json-rpc"
    }

    async fn verify(&self, asset: &AssetRecord) -> Result<Option<OnChainRecord>, DomainError> {
        let contract = asset.contract_address.as_deref().ok_or_else(|| {
            DomainError::BlockchainUnavailable(format!("asset {} has no contract address", asset.id))
        })?;
        if !is_valid_address(contract) {
            return Err(DomainError::BlockchainUnavailable(format!(
                "invalid contract address: {contract}"
            )));
        }
        let token_id = asset.token_id.unwrap_or(DEFAULT_TOKEN_ID);

        let owner = self
            .eth_call(contract, &encode_owner_of(token_id))
            .await?
            .as_deref()
            .and_then(decode_address);
        let Some(owner) = owner else {
            return Ok(None);
        };

        let token_uri_call = encode_token_uri(token_id);
        let (name, symbol, token_uri, chain_id) = tokio::join!(
            self.read_string(contract, NAME_SELECTOR),
            self.read_string(contract, SYMBOL_SELECTOR),
            self.read_string(contract, &token_uri_call),
            self.chain_id(),
        );
        Ok(Some(OnChainRecord {
            contract_address: contract.to_string(),
            token_id,
            owner,
            name,
            symbol,
            token_uri,
            chain_id,
        }))
    }
}
