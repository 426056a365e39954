use clap::Parser;
use rwa_pricing::application::pricing::PricingOptions;
use rwa_pricing::cli::commands::{Cli, Commands};
use rwa_pricing::domain::entities::asset_record::AssetRecord;
use rwa_pricing::domain::error::DomainError;
use rwa_pricing::infrastructure::settings::Settings;
use rwa_pricing::RwaPricing;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let app = match RwaPricing::new(settings) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error initializing rwa-pricing: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run_command(app, cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run_command(app: RwaPricing, cmd: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Commands::Price {
            asset_id,
            current_price,
            no_llm,
            verify_on_chain,
            include_factors,
        } => {
            let options = PricingOptions {
                use_llm: !no_llm,
                verify_on_chain,
                include_factors,
            };
            let signal = app.generate_price(&asset_id, current_price, &options).await?;
            println!("{}", serde_json::to_string_pretty(&signal)?);
        }
        Commands::Update {
            source,
            json,
            timestamp,
        } => {
            let payload: serde_json::Value = serde_json::from_str(&json)?;
            let ts = match timestamp {
                Some(t) => chrono::DateTime::parse_from_rfc3339(&t)
                    .map_err(|e| format!("Invalid timestamp {t}: {e}"))?
                    .with_timezone(&chrono::Utc),
                None => chrono::Utc::now(),
            };
            let ack = app.update_data_source(&source, payload, ts).await?;
            println!("{}", serde_json::to_string_pretty(&ack)?);
        }
        Commands::Asset { asset_id } => match app.get_asset(&asset_id)? {
            Some(asset) => println!("{}", serde_json::to_string_pretty(&asset)?),
            None => return Err(DomainError::NotFound(format!("asset {asset_id}")).into()),
        },
        Commands::Register { json } => {
            let record: AssetRecord = serde_json::from_str(&json)?;
            let asset = app.register_asset(record)?;
            println!("{}", serde_json::to_string_pretty(&asset)?);
        }
        Commands::Import { path } => {
            let json = std::fs::read_to_string(&path)?;
            let imported = app.import_assets(&json)?;
            println!("Imported {} assets", imported.len());
        }
        Commands::Assets => {
            let assets = app.list_assets()?;
            println!("{}", serde_json::to_string_pretty(&assets)?);
        }
        Commands::Similar { text, k } => {
            let hits = app.similar(&text, k).await?;
            println!("{}", serde_json::to_string_pretty(&hits)?);
        }
        Commands::Sources => {
            println!("{}", serde_json::to_string_pretty(&app.sources())?);
        }
        Commands::Stats => {
            let stats = app.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}
