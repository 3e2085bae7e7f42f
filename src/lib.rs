pub mod config;
pub mod controller; // Intents over AppState + persistence
pub mod dashboard; // Derived views (totals, schedule, search)
pub mod db;
pub mod generation; // Gemini gateway for SOAP notes and patient emails
pub mod models;
pub mod seed;
pub mod state; // Explicit application state snapshot
pub mod store; // pf_* key-value persistence

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::controller::{Controller, ControllerError};
use crate::generation::{Gateway, GeminiClient, GenerationError};
use crate::store::{SqliteStore, StoreError};

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Could not open practice store: {0}")]
    Store(#[from] StoreError),

    #[error("Could not load practice data: {0}")]
    Controller(#[from] ControllerError),

    #[error("Could not build generation client: {0}")]
    Generation(#[from] GenerationError),
}

/// Install the global tracing subscriber. `RUST_LOG` wins over the default
/// filter; calling this twice is harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
}

/// Install logging, open the on-disk store and load (or seed) all
/// practice data.
pub fn launch(config: &AppConfig) -> Result<Controller<SqliteStore>, LaunchError> {
    init_tracing();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let store = SqliteStore::open(&config.database_path())?;
    let controller = Controller::load(store, config.malformed_data, chrono::Utc::now())?;
    Ok(controller)
}

/// Gateway over the Gemini client described by `config`.
pub fn gemini_gateway(config: &AppConfig) -> Result<Gateway<GeminiClient>, LaunchError> {
    let client = GeminiClient::from_config(config)?;
    if !client.has_api_key() {
        tracing::warn!("No API key configured; drafting will return fallback messages");
    }
    Ok(Gateway::new(client, config.model.clone()))
}
