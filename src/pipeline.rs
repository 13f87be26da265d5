// src/pipeline.rs

use log::{debug, error, info, warn};
use serde::Serialize;

use crate::config::AppConfig;
use crate::error::{DashboardError, Result};
use crate::insights::{build_insights, tail, InsightRow, INSIGHT_TAIL};
use crate::models::{AdditiveModel, ForecastRow, PricePoint, PriceSeries};
use crate::utils::charts::{render_components, render_forecast, render_history};
use crate::utils::{evaluate_forecast, ForecastMetrics, MarketDataSource, SymbolEntry};

pub const MIN_HORIZON: u32 = 30;
pub const MAX_HORIZON: u32 = 365;

/// Rows of recent history shown above the charts
const HISTORY_TAIL: usize = 5;

/// Number of future days to forecast, always within 30..=365
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Horizon(u32);

impl Horizon {
    pub fn new(days: u32) -> Result<Self> {
        if (MIN_HORIZON..=MAX_HORIZON).contains(&days) {
            Ok(Horizon(days))
        } else {
            Err(DashboardError::InvalidHorizon(days))
        }
    }

    pub fn days(&self) -> u32 {
        self.0
    }
}

impl Default for Horizon {
    fn default() -> Self {
        Horizon(MIN_HORIZON)
    }
}

/// SVG charts; a chart that failed to render is `None`
#[derive(Debug, Serialize, Clone, Default)]
pub struct Charts {
    pub history: Option<String>,
    pub forecast: Option<String>,
    pub components: Option<String>,
}

/// Everything the dashboard shows for one selection
#[derive(Debug, Serialize, Clone)]
pub struct DashboardReport {
    pub name: String,
    pub symbol: String,
    pub horizon: Horizon,
    pub history_rows: usize,
    pub history_tail: Vec<PricePoint>,
    pub metrics: ForecastMetrics,
    /// The future part of the forecast (last `horizon` rows)
    pub forecast: Vec<ForecastRow>,
    pub insights: Vec<InsightRow>,
    pub charts: Charts,
}

fn keep_chart(kind: &str, rendered: Result<String>) -> Option<String> {
    match rendered {
        Ok(svg) => Some(svg),
        Err(e) => {
            warn!("Skipping {} chart: {}", kind, e);
            None
        }
    }
}

/// Fetches the candles for `entry` and returns the price series.
///
/// An empty upstream response stops here with `NoData`.
pub fn load_price_series(
    source: &dyn MarketDataSource,
    config: &AppConfig,
    entry: &SymbolEntry,
) -> Result<PriceSeries> {
    info!("Fetching data for {}...", entry.symbol);
    let candles = source.fetch_klines(&entry.symbol, config.interval, config.history_start)?;
    if candles.is_empty() {
        return Err(DashboardError::NoData(entry.symbol.clone()));
    }

    let series = PriceSeries::from_candles(&candles);
    if series.is_empty() {
        return Err(DashboardError::NoData(entry.symbol.clone()));
    }
    info!(
        "Fetched {} rows for {} ({:?} to {:?})",
        series.len(),
        entry.symbol,
        series.first_date(),
        series.last_date()
    );
    Ok(series)
}

/// Runs the whole dashboard pipeline for one selection:
/// fetch, reshape, fit, forecast, evaluate, derive insights, render charts.
pub fn run_dashboard(
    source: &dyn MarketDataSource,
    config: &AppConfig,
    entry: &SymbolEntry,
    horizon: Horizon,
) -> Result<DashboardReport> {
    let result = build_report(source, config, entry, horizon);
    if let Err(e) = &result {
        error!("Dashboard run for {} failed: {}", entry.symbol, e);
    }
    result
}

fn build_report(
    source: &dyn MarketDataSource,
    config: &AppConfig,
    entry: &SymbolEntry,
    horizon: Horizon,
) -> Result<DashboardReport> {
    let series = load_price_series(source, config, entry)?;

    let model = AdditiveModel::fit(&series, &config.model)?;
    let forecast = model.forecast(horizon.days() as usize)?;
    debug!("Forecast has {} rows for {}", forecast.len(), entry.symbol);

    let metrics = evaluate_forecast(&series, &forecast)?;
    info!(
        "{}: MAE {:.2}, RMSE {:.2} over {} days",
        entry.symbol, metrics.mae, metrics.rmse, metrics.compared
    );

    let insights = build_insights(&series, &forecast);

    let charts = Charts {
        history: keep_chart("history", render_history(&entry.snome, &series)),
        forecast: keep_chart("forecast", render_forecast(&entry.snome, &series, &forecast)),
        components: keep_chart("components", render_components(&forecast, model.config())),
    };

    Ok(DashboardReport {
        name: entry.snome.clone(),
        symbol: entry.symbol.clone(),
        horizon,
        history_rows: series.len(),
        history_tail: series.tail(HISTORY_TAIL).to_vec(),
        metrics,
        forecast: forecast.tail(horizon.days() as usize).to_vec(),
        insights: tail(&insights, INSIGHT_TAIL).to_vec(),
        charts,
    })
}
