// src/utils/data_processing.rs

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{DashboardError, Result};
use crate::models::{ForecastRow, ForecastTable, PricePoint, PriceSeries};

/// Error metrics of the prediction against actual prices
#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct ForecastMetrics {
    pub mae: f64,
    pub rmse: f64,
    /// Number of dates present in both the series and the forecast
    pub compared: usize,
}

/// Percent change from the previous value, times 100.
///
/// The first entry, and any entry whose predecessor is zero or not finite, is `None`.
pub fn pct_change(values: &[f64]) -> Vec<Option<f64>> {
    let mut changes = Vec::with_capacity(values.len());
    if values.is_empty() {
        return changes;
    }
    changes.push(None);
    for pair in values.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        let change = if prev != 0.0 && prev.is_finite() && curr.is_finite() {
            Some((curr - prev) / prev * 100.0)
        } else {
            None
        };
        changes.push(change);
    }
    changes
}

/// Inner join of the price series and the forecast on date, ordered by date.
pub fn join_on_date<'a>(
    series: &'a PriceSeries,
    forecast: &'a ForecastTable,
) -> Vec<(&'a PricePoint, &'a ForecastRow)> {
    let by_date: HashMap<NaiveDate, &ForecastRow> =
        forecast.rows.iter().map(|row| (row.date, row)).collect();

    let mut joined: Vec<(&PricePoint, &ForecastRow)> = series
        .points
        .iter()
        .filter_map(|point| by_date.get(&point.date).map(|row| (point, *row)))
        .collect();
    joined.sort_by_key(|(point, _)| point.date);
    joined.dedup_by_key(|(point, _)| point.date);
    joined
}

// Mean absolute error and root mean squared error
pub fn calculate_metrics(predictions: &[f64], targets: &[f64]) -> (f64, f64) {
    let n = predictions.len().min(targets.len());
    if n == 0 {
        return (f64::NAN, f64::NAN);
    }

    let mae = predictions
        .iter()
        .zip(targets)
        .map(|(pred, target)| (pred - target).abs())
        .sum::<f64>()
        / n as f64;

    let mse = predictions
        .iter()
        .zip(targets)
        .map(|(pred, target)| (pred - target).powi(2))
        .sum::<f64>()
        / n as f64;

    (mae, mse.sqrt())
}

/// Compares predicted and actual prices on the dates both tables share.
pub fn evaluate_forecast(series: &PriceSeries, forecast: &ForecastTable) -> Result<ForecastMetrics> {
    let joined = join_on_date(series, forecast);
    if joined.is_empty() {
        return Err(DashboardError::Model(
            "forecast shares no dates with the price series".to_string(),
        ));
    }

    let targets: Vec<f64> = joined.iter().map(|(point, _)| point.price).collect();
    let predictions: Vec<f64> = joined.iter().map(|(_, row)| row.yhat).collect();
    let (mae, rmse) = calculate_metrics(&predictions, &targets);

    Ok(ForecastMetrics {
        mae,
        rmse,
        compared: joined.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Duration;

    fn day(i: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(i)
    }

    fn row(i: i64, yhat: f64) -> ForecastRow {
        ForecastRow {
            date: day(i),
            yhat,
            yhat_lower: yhat,
            yhat_upper: yhat,
            trend: yhat,
            yearly: 0.0,
            weekly: 0.0,
            holidays: 0.0,
        }
    }

    fn point(i: i64, price: f64) -> PricePoint {
        PricePoint { date: day(i), price, volume: 1.0 }
    }

    #[test]
    fn pct_change_first_is_undefined() {
        let changes = pct_change(&[100.0, 110.0, 99.0]);
        assert_eq!(changes[0], None);
        assert_relative_eq!(changes[1].unwrap(), 10.0, epsilon = 1e-9);
        assert_relative_eq!(changes[2].unwrap(), -10.0, epsilon = 1e-9);
    }

    #[test]
    fn pct_change_after_zero_is_undefined() {
        assert_eq!(pct_change(&[0.0, 5.0]), vec![None, None]);
        assert!(pct_change(&[]).is_empty());
    }

    #[test]
    fn metrics_match_hand_computation() {
        let (mae, rmse) = calculate_metrics(&[1.0, 2.0, 3.0], &[2.0, 2.0, 5.0]);
        assert_relative_eq!(mae, 1.0);
        assert_relative_eq!(rmse, (5.0_f64 / 3.0).sqrt());
    }

    #[test]
    fn join_keeps_only_shared_dates() {
        let series = PriceSeries::from_points(vec![point(0, 1.0), point(1, 2.0), point(5, 3.0)]);
        let forecast = ForecastTable {
            rows: vec![row(1, 2.5), row(2, 2.0), row(5, 3.5), row(6, 4.0)],
        };
        let joined = join_on_date(&series, &forecast);
        let dates: Vec<_> = joined.iter().map(|(p, _)| p.date).collect();
        assert_eq!(dates, vec![day(1), day(5)]);
        assert!(joined.iter().all(|(p, r)| p.date == r.date));
    }

    #[test]
    fn evaluate_uses_joined_rows() {
        let series = PriceSeries::from_points(vec![point(0, 10.0), point(1, 20.0)]);
        let forecast = ForecastTable {
            rows: vec![row(0, 12.0), row(1, 18.0), row(2, 25.0)],
        };
        let metrics = evaluate_forecast(&series, &forecast).unwrap();
        assert_eq!(metrics.compared, 2);
        assert_relative_eq!(metrics.mae, 2.0);
        assert_relative_eq!(metrics.rmse, 2.0);
    }

    #[test]
    fn evaluate_without_overlap_fails() {
        let series = PriceSeries::from_points(vec![point(0, 10.0)]);
        let forecast = ForecastTable { rows: vec![row(3, 1.0)] };
        assert!(evaluate_forecast(&series, &forecast).is_err());
    }
}
