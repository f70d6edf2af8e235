use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use goalline_backend::{api, cli, db, services::ModelService};

#[derive(Parser)]
#[command(name = "goalline")]
#[command(about = "Over/under 2.5 goals prediction service for football matches")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Predict a single fixture
    Predict {
        #[arg(long)]
        home: String,
        #[arg(long)]
        away: String,
        #[arg(long, default_value = "Premier League")]
        league: String,
        /// Match date, YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        over_odds: Option<f64>,
        #[arg(long)]
        under_odds: Option<f64>,
    },
    /// List upcoming fixtures with over/under 2.5 odds
    Fixtures {
        #[arg(short, long, default_value = "soccer_epl")]
        sport_key: String,
    },
    /// Show classifier load state and metadata
    ModelInfo,
    /// Seed the historical match store with demo data
    Seed,
    /// Initialize the database
    InitDb,
}

fn model_path() -> PathBuf {
    env::var("MODEL_PATH")
        .unwrap_or_else(|_| "models/over25_logistic_v1.json".to_string())
        .into()
}

/// Load the classifier at startup. Callers decide whether a missing model
/// is fatal; the server keeps running and answers 503 until one appears.
async fn load_model(required: bool) -> Result<Arc<ModelService>> {
    let model = Arc::new(ModelService::new());
    let path = model_path();

    if let Err(e) = model.load(&path).await {
        if required {
            return Err(e);
        }
        tracing::warn!(
            "Model could not be loaded from {}: {}; prediction endpoints will return 503",
            path.display(),
            e
        );
    }

    Ok(model)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "goalline_backend=info,tower_http=info".into()),
        )
        .init();

    dotenv::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { port }) => {
            tracing::info!("Starting Goalline API server on port {}", port);
            let model = load_model(false).await?;
            api::serve(port, model).await?;
        }
        Some(Commands::Predict {
            home,
            away,
            league,
            date,
            over_odds,
            under_odds,
        }) => {
            let model = load_model(true).await?;
            cli::predict(model, &home, &away, &league, date, over_odds, under_odds).await?;
        }
        Some(Commands::Fixtures { sport_key }) => {
            cli::upcoming_fixtures(&sport_key).await?;
        }
        Some(Commands::ModelInfo) => {
            let model = load_model(false).await?;
            cli::model_info(model).await?;
        }
        Some(Commands::Seed) => {
            cli::seed().await?;
        }
        Some(Commands::InitDb) => {
            tracing::info!("Initializing database...");
            db::init_database().await?;
        }
        None => {
            // Default to serving
            tracing::info!("Starting Goalline API server on port 3000");
            let model = load_model(false).await?;
            api::serve(3000, model).await?;
        }
    }

    Ok(())
}
