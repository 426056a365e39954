pub mod asset_repo;
pub mod knowledge_store;
pub mod migrations;
pub mod snapshot_repo;
