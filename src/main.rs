use evote_gateway::{
    api::Server,
    config::Config,
    ledger::ContractClient,
    media::CloudinaryStore,
};
use std::sync::Arc;
use tracing::info;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// The main entry point for the gateway.
///
/// Initializes logging, loads the configuration, constructs the ledger
/// and media clients once, and hands them to the API server. The clients
/// are the only shared state; handlers receive them by injection.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config_path =
        std::env::var("EVOTE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)?;
    info!("Gateway starting with config from {config_path}");

    // One ledger client per process; it serializes its own request queue.
    let ledger = Arc::new(ContractClient::connect(&config.ledger)?);

    let media = Arc::new(CloudinaryStore::new(config.media.clone()));

    let server = Server::new(config, ledger, media);
    server.start().await?;

    Ok(())
}
