use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "rwa-pricing",
    about = "Price signals for tokenized real-world assets"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a price signal for an asset
    Price {
        asset_id: String,
        /// Current or previous price used as the baseline
        #[arg(long)]
        current_price: Option<f64>,
        /// Skip the reasoning gateway and use the deterministic blend only
        #[arg(long)]
        no_llm: bool,
        /// Verify ownership on chain and weight the blockchain factor
        #[arg(long)]
        verify_on_chain: bool,
        /// Include the per-factor breakdown
        #[arg(long)]
        include_factors: bool,
    },
    /// Submit a data source snapshot
    Update {
        /// Source name (market_data, auction_data, sentiment, economic_indicators, ...)
        source: String,
        /// JSON payload
        json: String,
        /// Snapshot time (RFC3339); defaults to now
        #[arg(long)]
        timestamp: Option<String>,
    },
    /// Show an asset record
    Asset { asset_id: String },
    /// Register or update an asset
    Register {
        /// JSON with id, name, category, description, initial_price, contract_address, token_id
        json: String,
    },
    /// Bulk-register assets from a JSON array file
    Import { path: String },
    /// List registered assets
    Assets,
    /// Search the knowledge base
    Similar {
        text: String,
        #[arg(long, default_value = "5")]
        k: usize,
    },
    /// List cached data sources
    Sources,
    /// Show engine statistics
    Stats,
}
