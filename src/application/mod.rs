pub mod assets;
pub mod data_sources;
pub mod knowledge_base;
pub mod pricing;
pub mod reasoning;
pub mod stats;
