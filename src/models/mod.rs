// src/models/mod.rs

pub mod additive;
pub mod holidays;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

/// One OHLCV candle as returned by the exchange
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Candle {
    /// Open time in milliseconds since the Unix epoch
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub close_time: i64,
    pub quote_volume: f64,
    pub trades: u64,
}

/// Closing price and volume for one trading interval
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
    pub volume: f64,
}

/// Price history of one symbol, ascending by date with unique dates
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct PriceSeries {
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Reshapes raw candles into `(date, close, volume)` rows.
    ///
    /// Candles with a non-finite close or an out-of-range timestamp are
    /// skipped. When two candles fall on the same date the later one wins.
    pub fn from_candles(candles: &[Candle]) -> Self {
        let mut points: Vec<PricePoint> = candles
            .iter()
            .filter(|c| c.close.is_finite())
            .filter_map(|c| {
                let date = DateTime::from_timestamp_millis(c.open_time)?.date_naive();
                Some(PricePoint {
                    date,
                    price: c.close,
                    volume: if c.volume.is_finite() { c.volume } else { f64::NAN },
                })
            })
            .collect();

        // Stable sort keeps exchange order within a date, so the last one is the newest.
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }

        PriceSeries { points: deduped }
    }

    pub fn from_points(mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        points.dedup_by_key(|p| p.date);
        PriceSeries { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Last `n` rows, oldest first
    pub fn tail(&self, n: usize) -> &[PricePoint] {
        let start = self.points.len().saturating_sub(n);
        &self.points[start..]
    }
}

/// One forecast date with its prediction, bounds and additive components
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ForecastRow {
    pub date: NaiveDate,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
    pub trend: f64,
    pub yearly: f64,
    pub weekly: f64,
    pub holidays: f64,
}

/// Predictions over the history plus the future horizon, ascending by date
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ForecastTable {
    pub rows: Vec<ForecastRow>,
}

impl ForecastTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn tail(&self, n: usize) -> &[ForecastRow] {
        let start = self.rows.len().saturating_sub(n);
        &self.rows[start..]
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }
}

pub use additive::AdditiveModel;

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open_time: i64, close: f64, volume: f64) -> Candle {
        Candle {
            open_time,
            open: close,
            high: close,
            low: close,
            close,
            volume,
            close_time: open_time + 86_399_999,
            quote_volume: 0.0,
            trades: 0,
        }
    }

    const DAY_MS: i64 = 86_400_000;

    #[test]
    fn from_candles_sorts_and_converts_dates() {
        // 2021-01-01T00:00:00Z
        let base = 1_609_459_200_000;
        let candles = vec![
            candle(base + 2 * DAY_MS, 3.0, 30.0),
            candle(base, 1.0, 10.0),
            candle(base + DAY_MS, 2.0, 20.0),
        ];
        let series = PriceSeries::from_candles(&candles);

        assert_eq!(series.len(), 3);
        assert_eq!(series.first_date(), NaiveDate::from_ymd_opt(2021, 1, 1));
        assert_eq!(series.last_date(), NaiveDate::from_ymd_opt(2021, 1, 3));
        assert_eq!(series.prices(), vec![1.0, 2.0, 3.0]);
        assert_eq!(series.points[1].volume, 20.0);
    }

    #[test]
    fn from_candles_keeps_last_candle_of_a_date_and_skips_nan() {
        let base = 1_609_459_200_000;
        let candles = vec![
            candle(base, 1.0, 10.0),
            candle(base + 3_600_000, 1.5, 15.0),
            candle(base + DAY_MS, f64::NAN, 20.0),
        ];
        let series = PriceSeries::from_candles(&candles);

        assert_eq!(series.len(), 1);
        assert_eq!(series.points[0].price, 1.5);
    }

    #[test]
    fn tail_is_clamped_to_length() {
        let series = PriceSeries::from_candles(&[candle(1_609_459_200_000, 1.0, 1.0)]);
        assert_eq!(series.tail(5).len(), 1);
        assert!(PriceSeries::default().tail(5).is_empty());
    }
}
