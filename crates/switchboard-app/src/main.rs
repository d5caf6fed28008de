//! Switchboard application binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Open the SQLite history store under the data directory
//! 3. Build the chat engine for the configured variant
//! 4. Start the axum REST API server

mod cli;
mod engine;

use std::sync::Arc;

use clap::Parser;

use switchboard_api::auth::{load_or_generate_token, TOKEN_FILE};
use switchboard_api::routes;
use switchboard_api::state::AppState;
use switchboard_core::config::SwitchboardConfig;
use switchboard_storage::{Database, HistoryStore, SqliteHistoryStore};

use crate::cli::{expand_home, CliArgs};
use crate::engine::{build_engine, Capabilities};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    let config_path = args.resolve_config_path();
    let loaded = SwitchboardConfig::load(&config_path);

    // Tracing. RUST_LOG wins over the flag and the config file.
    let log_level = args
        .resolve_log_level()
        .or_else(|| loaded.as_ref().ok().map(|c| c.general.log_level.clone()))
        .unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    tracing::info!("Starting Switchboard v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(
                path = %config_path.display(),
                error = %e,
                "Failed to load config, using defaults"
            );
            SwitchboardConfig::default()
        }
    };
    config.api.port = args.resolve_port(config.api.port);
    if let Some(dir) = args.resolve_data_dir() {
        config.general.data_dir = dir;
    }
    if let Some(variant) = args.variant {
        config.general.variant = variant;
    }
    config.general.log_level = log_level;
    config.validate()?;

    // Storage.
    let data_dir = expand_home(&config.general.data_dir);
    std::fs::create_dir_all(&data_dir)?;
    let db_path = data_dir.join("switchboard.db");
    let db = Arc::new(Database::new(&db_path)?);
    let store: Arc<dyn HistoryStore> = Arc::new(SqliteHistoryStore::new(db));
    tracing::info!(path = %db_path.display(), "History store opened");

    // Capabilities and engine. The API key is read from the environment
    // once, here, and passed down explicitly.
    let capabilities = Capabilities::resolve(
        &config.llm,
        args.mock,
        std::env::var("OPENAI_API_KEY").ok(),
    );
    if args.mock {
        tracing::warn!("Mock mode: answers come from stub capabilities");
    }
    let engine = build_engine(&config, capabilities, store)?;
    tracing::info!(
        variant = %config.general.variant,
        roles = ?engine.roles(),
        policy = ?config.coordinator.rejection_policy,
        "Chat engine ready"
    );

    // API server.
    let api_token = if config.api.api_token.trim().is_empty() {
        load_or_generate_token(&data_dir.join(TOKEN_FILE))
    } else {
        config.api.api_token.clone()
    };
    let state = AppState::new(engine, config.clone(), api_token);
    routes::start_server(&config, state).await?;

    Ok(())
}
