// src/config.rs

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use log::warn;

use crate::error::{DashboardError, Result};
use crate::utils::binance::KlineInterval;

/// Settings for the additive forecasting model
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub yearly_seasonality: bool,
    pub weekly_seasonality: bool,
    pub holidays: bool,
    pub uncertainty_samples: usize,
    pub interval_width: f64,
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            yearly_seasonality: true,
            weekly_seasonality: true,
            holidays: true,
            uncertainty_samples: 1000,
            interval_width: 0.8,
            seed: 42,
        }
    }
}

/// Dashboard configuration derived from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: String,
    pub port: u16,
    pub binance_base_url: String,
    /// Sent as `X-MBX-APIKEY` when set. Klines are public, so it is optional.
    pub binance_api_key: Option<String>,
    pub binance_timeout_secs: u64,
    pub symbols_path: PathBuf,
    pub frontend_dir: PathBuf,
    pub history_start: NaiveDate,
    pub interval: KlineInterval,
    pub model: ModelConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            bind: "127.0.0.1".to_string(),
            port: 8080,
            binance_base_url: "https://api.binance.com".to_string(),
            binance_api_key: None,
            binance_timeout_secs: 30,
            symbols_path: PathBuf::from("data/crypto.csv"),
            frontend_dir: PathBuf::from("./frontend"),
            history_start: NaiveDate::from_ymd_opt(2010, 1, 1).unwrap_or_default(),
            interval: KlineInterval::OneDay,
            model: ModelConfig::default(),
        }
    }
}

fn env_str(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_parse<T: FromStr>(name: &str, default: T) -> T {
    match env_str(name) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Ignoring malformed {}={:?}, using default", name, raw);
            default
        }),
        None => default,
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    env_str(name)
        .map(|s| matches!(s.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

impl AppConfig {
    /// Reads the configuration from the environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        let defaults = AppConfig::default();

        let history_start = match env_str("HISTORY_START") {
            Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| {
                DashboardError::InvalidConfig(format!("HISTORY_START={:?}: {}", raw, e))
            })?,
            None => defaults.history_start,
        };

        let interval = match env_str("KLINE_INTERVAL") {
            Some(raw) => raw.parse()?,
            None => defaults.interval,
        };

        let model_defaults = ModelConfig::default();
        let interval_width = env_parse("FORECAST_INTERVAL_WIDTH", model_defaults.interval_width);
        if !(interval_width > 0.0 && interval_width < 1.0) {
            return Err(DashboardError::InvalidConfig(format!(
                "FORECAST_INTERVAL_WIDTH must be in (0, 1), got {}",
                interval_width
            )));
        }

        Ok(AppConfig {
            bind: env_str("DASHBOARD_BIND").unwrap_or(defaults.bind),
            port: env_parse("DASHBOARD_PORT", defaults.port),
            binance_base_url: env_str("BINANCE_BASE_URL").unwrap_or(defaults.binance_base_url),
            binance_api_key: env_str("BINANCE_API_KEY"),
            binance_timeout_secs: env_parse("BINANCE_TIMEOUT_SECS", defaults.binance_timeout_secs),
            symbols_path: env_str("SYMBOLS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.symbols_path),
            frontend_dir: env_str("FRONTEND_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.frontend_dir),
            history_start,
            interval,
            model: ModelConfig {
                yearly_seasonality: env_bool("FORECAST_YEARLY", model_defaults.yearly_seasonality),
                weekly_seasonality: env_bool("FORECAST_WEEKLY", model_defaults.weekly_seasonality),
                holidays: env_bool("FORECAST_HOLIDAYS", model_defaults.holidays),
                uncertainty_samples: env_parse(
                    "FORECAST_UNCERTAINTY_SAMPLES",
                    model_defaults.uncertainty_samples,
                ),
                interval_width,
                seed: env_parse("FORECAST_SEED", model_defaults.seed),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_dashboard() {
        let config = AppConfig::default();
        assert_eq!(config.history_start, NaiveDate::from_ymd_opt(2010, 1, 1).unwrap());
        assert_eq!(config.interval, KlineInterval::OneDay);
        assert_eq!(config.port, 8080);
        assert!(config.model.holidays);
        assert_eq!(config.model.uncertainty_samples, 1000);
    }
}
