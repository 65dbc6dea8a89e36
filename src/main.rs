use foodtruck_api::FoodTruckClient;
use foodtruck_brain::Brain;
use foodtruck_core::config::Config;
use foodtruck_core::error::Result;
use foodtruck_core::logger::init_tracing;
use foodtruck_telegram::TelegramBot;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Bound on transport events waiting for the event loop.
const EVENT_BUFFER: usize = 64;

#[tokio::main]
async fn main() {
    let config_path =
        std::env::var("FOODTRUCK_CONFIG").unwrap_or_else(|_| "foodtruck.toml".to_string());

    let config = Config::load(Path::new(&config_path)).unwrap_or_else(|e| {
        eprintln!("fatal: failed to load config: {e}");
        std::process::exit(1);
    });

    if let Err(e) = init_tracing(&config.log) {
        eprintln!("fatal: failed to initialize logging: {e}");
        std::process::exit(1);
    }

    if config.telegram.token.is_empty() {
        error!("FOODTRUCK_TELEGRAM_TOKEN is not set");
        std::process::exit(1);
    }

    if let Err(e) = run(config).await {
        error!(error = %e, "fatal");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<()> {
    let api = Arc::new(FoodTruckClient::new(config.api.base_url.clone())?);
    let bot = Arc::new(TelegramBot::new(&config.telegram.token));
    let brain = Brain::new(&config, api, bot.clone());

    // Fail on a bad schedule before connecting.
    let schedule = brain.broadcast_schedule()?;

    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let _connection = bot.connect(tx);
    info!("foodtruck bot starting");

    tokio::select! {
        result = brain.run_event_loop(rx) => result,
        result = async {
            match schedule {
                Some(schedule) => brain.run_broadcast_loop(schedule).await,
                None => std::future::pending::<Result<()>>().await,
            }
        } => result,
    }
}
