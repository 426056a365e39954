pub mod asset_record;
pub mod knowledge_entry;
pub mod price_signal;
pub mod snapshot;
