// src/utils/binance.rs

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use log::{debug, info};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::error::{DashboardError, Result};
use crate::models::Candle;

/// Maximum candles Binance returns per request
const PAGE_LIMIT: usize = 1000;

/// Candle intervals that yield at most one candle per calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KlineInterval {
    OneDay,
    ThreeDay,
    OneWeek,
}

impl KlineInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            KlineInterval::OneDay => "1d",
            KlineInterval::ThreeDay => "3d",
            KlineInterval::OneWeek => "1w",
        }
    }
}

impl fmt::Display for KlineInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KlineInterval {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "1d" => Ok(KlineInterval::OneDay),
            "3d" => Ok(KlineInterval::ThreeDay),
            "1w" => Ok(KlineInterval::OneWeek),
            other => Err(DashboardError::InvalidConfig(format!(
                "unsupported kline interval {:?} (expected 1d, 3d or 1w)",
                other
            ))),
        }
    }
}

/// Source of historical candles. The dashboard holds one shared instance.
pub trait MarketDataSource: Send + Sync {
    /// Every candle of `symbol` from `start` onwards, oldest first.
    fn fetch_klines(&self, symbol: &str, interval: KlineInterval, start: NaiveDate) -> Result<Vec<Candle>>;
}

/// Raw kline row:
/// `[openTime, open, high, low, close, volume, closeTime, quoteVolume, trades, takerBase, takerQuote, ignore]`
#[derive(Debug, Deserialize)]
struct RawKline(
    i64,
    String,
    String,
    String,
    String,
    String,
    i64,
    String,
    u64,
    #[allow(dead_code)] String,
    #[allow(dead_code)] String,
    #[allow(dead_code)] serde_json::Value,
);

// Binance error payload
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: i64,
    msg: String,
}

fn parse_decimal(field: &str, raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .map_err(|e| DashboardError::UpstreamPayload(format!("invalid {} value {:?}: {}", field, raw, e)))
}

impl RawKline {
    fn into_candle(self) -> Result<Candle> {
        Ok(Candle {
            open_time: self.0,
            open: parse_decimal("open", &self.1)?,
            high: parse_decimal("high", &self.2)?,
            low: parse_decimal("low", &self.3)?,
            close: parse_decimal("close", &self.4)?,
            volume: parse_decimal("volume", &self.5)?,
            close_time: self.6,
            quote_volume: parse_decimal("quote volume", &self.7)?,
            trades: self.8,
        })
    }
}

/// Parses a `/api/v3/klines` response body.
pub fn parse_klines(body: &str) -> Result<Vec<Candle>> {
    let rows: Vec<RawKline> = serde_json::from_str(body)
        .map_err(|e| DashboardError::UpstreamPayload(format!("malformed klines: {}", e)))?;
    rows.into_iter().map(RawKline::into_candle).collect()
}

/// Binance spot REST client (public market data only)
#[derive(Debug, Clone)]
pub struct BinanceClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl BinanceClient {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(BinanceClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    fn fetch_page(&self, symbol: &str, interval: KlineInterval, start_ms: i64) -> Result<Vec<Candle>> {
        let url = format!("{}/api/v3/klines", self.base_url);
        let mut request = self.client.get(&url).query(&[
            ("symbol", symbol.to_string()),
            ("interval", interval.to_string()),
            ("startTime", start_ms.to_string()),
            ("limit", PAGE_LIMIT.to_string()),
        ]);
        if let Some(key) = &self.api_key {
            request = request.header("X-MBX-APIKEY", key);
        }

        let response = request.send()?;
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(err) => DashboardError::Exchange { code: err.code, msg: err.msg },
                Err(_) => DashboardError::Exchange {
                    code: i64::from(status.as_u16()),
                    msg: body,
                },
            });
        }

        parse_klines(&body)
    }
}

impl MarketDataSource for BinanceClient {
    fn fetch_klines(&self, symbol: &str, interval: KlineInterval, start: NaiveDate) -> Result<Vec<Candle>> {
        let mut start_ms = start.and_time(NaiveTime::MIN).and_utc().timestamp_millis();
        let mut candles = Vec::new();

        loop {
            let page = self.fetch_page(symbol, interval, start_ms)?;
            let page_len = page.len();
            debug!("Fetched {} candles for {} from {}", page_len, symbol, start_ms);

            let Some(last) = page.last() else { break };
            start_ms = last.open_time + 1;
            candles.extend(page);

            if page_len < PAGE_LIMIT {
                break;
            }
        }

        info!("Fetched {} {} candles for {}", candles.len(), interval, symbol);
        Ok(candles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::ResponseError;

    #[test]
    fn parses_binance_kline_rows() {
        let body = r#"[
            [1499040000000, "0.01634790", "0.80000000", "0.01575800", "0.01577100",
             "148976.11427815", 1499644799999, "2434.19055334", 308,
             "1756.87402397", "28.46694368", "0"]
        ]"#;
        let candles = parse_klines(body).unwrap();
        assert_eq!(candles.len(), 1);
        let c = &candles[0];
        assert_eq!(c.open_time, 1499040000000);
        assert_eq!(c.close, 0.015771);
        assert_eq!(c.volume, 148976.11427815);
        assert_eq!(c.trades, 308);
    }

    #[test]
    fn empty_body_is_no_candles() {
        assert!(parse_klines("[]").unwrap().is_empty());
    }

    #[test]
    fn malformed_payload_is_an_upstream_error() {
        let body = r#"[[1, "x", "1", "1", "1", "1", 2, "1", 1, "1", "1", "0"]]"#;
        let err = parse_klines(body).unwrap_err();
        assert!(matches!(err, DashboardError::UpstreamPayload(_)));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);

        let err = parse_klines(r#"{"unexpected": true}"#).unwrap_err();
        assert!(matches!(err, DashboardError::UpstreamPayload(_)));
    }

    #[test]
    fn interval_round_trips_through_strings() {
        for raw in ["1d", "3d", "1w"] {
            let interval: KlineInterval = raw.parse().unwrap();
            assert_eq!(interval.as_str(), raw);
        }
        assert!("1h".parse::<KlineInterval>().is_err());
    }
}
