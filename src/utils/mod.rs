// src/utils/mod.rs

pub mod binance;
pub mod catalog;
pub mod charts;
pub mod data_processing;

pub use binance::{BinanceClient, KlineInterval, MarketDataSource};
pub use catalog::{SymbolCatalog, SymbolEntry};
pub use data_processing::{
    calculate_metrics,
    evaluate_forecast,
    join_on_date,
    pct_change,
    ForecastMetrics,
};
