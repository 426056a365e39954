pub mod asset_repository;
pub mod chain_verifier;
pub mod embedding_port;
pub mod knowledge_store;
pub mod reasoning_port;
pub mod snapshot_repository;
