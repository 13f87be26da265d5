// src/main.rs

use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use log::{error, info};

use crypto_forecast_dashboard::api::AppStateStruct;
use crypto_forecast_dashboard::config::AppConfig;
use crypto_forecast_dashboard::server::run_server;
use crypto_forecast_dashboard::utils::{BinanceClient, MarketDataSource, SymbolCatalog};

fn to_io_error(e: crypto_forecast_dashboard::DashboardError) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
}

fn main() -> Result<(), std::io::Error> {
    // Initialize environment variables
    dotenv::dotenv().ok();

    // Initialize the logger
    env_logger::init();

    let config = AppConfig::from_env().map_err(|e| {
        error!("Invalid configuration: {}", e);
        to_io_error(e)
    })?;

    let catalog = SymbolCatalog::load(&config.symbols_path).map_err(|e| {
        error!("Failed to load symbol catalog: {}", e);
        to_io_error(e)
    })?;
    info!(
        "Loaded {} symbols from {}",
        catalog.entries().len(),
        config.symbols_path.display()
    );

    // The blocking client owns a runtime of its own, so it is built outside actix's.
    let client = BinanceClient::new(
        &config.binance_base_url,
        config.binance_api_key.clone(),
        Duration::from_secs(config.binance_timeout_secs),
    )
    .map_err(to_io_error)?;

    let source: Arc<dyn MarketDataSource> = Arc::new(client);

    let app_state = web::Data::new(AppStateStruct {
        config: Arc::new(config),
        catalog: Arc::new(catalog),
        source: source.clone(),
    });

    let result = actix_web::rt::System::new().block_on(run_server(app_state));
    // Last handle to the client is released here, off the async runtime.
    drop(source);
    result
}
