//! Cryptocurrency price forecast dashboard.
//!
//! Fetches daily candles from Binance for a coin picked from a static
//! catalog, fits an additive trend + seasonality + holidays model, and serves
//! the forecast, its error metrics, Buy/Sell/Hold signals and SVG charts to a
//! single-page frontend.

pub mod api;
pub mod config;
pub mod error;
pub mod insights;
pub mod models;
pub mod pipeline;
pub mod server;
pub mod utils;

pub use crate::config::AppConfig;
pub use crate::error::{DashboardError, Result};
pub use crate::insights::{InsightRow, Signal};
pub use crate::pipeline::{run_dashboard, DashboardReport, Horizon};
