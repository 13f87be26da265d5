// src/api/mod.rs

use std::sync::Arc;

use crate::config::AppConfig;
use crate::utils::{MarketDataSource, SymbolCatalog};

/// Application state shared by all handlers. Nothing in it is mutated after startup.
pub struct AppStateStruct {
    pub config: Arc<AppConfig>,
    pub catalog: Arc<SymbolCatalog>,
    /// The single exchange client of the process
    pub source: Arc<dyn MarketDataSource>,
}

/// Re-export handlers
pub mod handlers;

pub use handlers::{configure, get_forecast, get_symbols};
