// src/insights.rs

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{ForecastTable, PriceSeries};
use crate::utils::data_processing::{join_on_date, pct_change};

/// Percent change of the predicted price beyond which a move is acted on
pub const SIGNAL_THRESHOLD: f64 = 2.0;

/// Number of insight rows shown on the dashboard
pub const INSIGHT_TAIL: usize = 10;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    /// `> 2%` is Buy, `< -2%` is Sell, anything else (including ±2% exactly
    /// and an undefined change) is Hold.
    pub fn classify(price_change: Option<f64>) -> Signal {
        match price_change {
            Some(change) if change > SIGNAL_THRESHOLD => Signal::Buy,
            Some(change) if change < -SIGNAL_THRESHOLD => Signal::Sell,
            _ => Signal::Hold,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Signal::Buy => "Buy",
            Signal::Sell => "Sell",
            Signal::Hold => "Hold",
        };
        f.write_str(label)
    }
}

/// Forecast and actual values for one date, with derived changes and signal
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InsightRow {
    pub date: NaiveDate,
    pub predicted_price: f64,
    pub actual_price: f64,
    pub volume: f64,
    /// Percent change of the predicted price; `None` on the first row
    pub price_change: Option<f64>,
    pub volume_change: Option<f64>,
    pub signal: Signal,
}

/// One row per date present in both the series and the forecast, oldest first.
pub fn build_insights(series: &PriceSeries, forecast: &ForecastTable) -> Vec<InsightRow> {
    let joined = join_on_date(series, forecast);

    let predicted: Vec<f64> = joined.iter().map(|(_, row)| row.yhat).collect();
    let volumes: Vec<f64> = joined.iter().map(|(point, _)| point.volume).collect();
    let price_changes = pct_change(&predicted);
    let volume_changes = pct_change(&volumes);

    joined
        .iter()
        .zip(price_changes)
        .zip(volume_changes)
        .map(|(((point, row), price_change), volume_change)| InsightRow {
            date: point.date,
            predicted_price: row.yhat,
            actual_price: point.price,
            volume: point.volume,
            price_change,
            volume_change,
            signal: Signal::classify(price_change),
        })
        .collect()
}

/// Last `n` rows, oldest first
pub fn tail(rows: &[InsightRow], n: usize) -> &[InsightRow] {
    &rows[rows.len().saturating_sub(n)..]
}
