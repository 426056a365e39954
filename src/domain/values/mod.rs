pub mod asset_category;
pub mod confidence;
pub mod factor;
pub mod freshness;
pub mod normalize;
pub mod trend;
pub mod warning;
