pub mod blockchain;
pub mod cache;
pub mod embeddings;
pub mod llm;
pub mod settings;
pub mod sqlite;
