// src/error.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by the dashboard, from catalog loading to chart rendering.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Symbol catalog error: {0}")]
    Catalog(String),

    #[error("Unknown cryptocurrency: {0}")]
    UnknownSymbol(String),

    #[error("Forecast horizon must be between 30 and 365 days, got {0}")]
    InvalidHorizon(u32),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Error fetching data from the exchange: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Exchange rejected the request ({code}): {msg}")]
    Exchange { code: i64, msg: String },

    #[error("Unexpected response from the exchange: {0}")]
    UpstreamPayload(String),

    /// Upstream returned no candles; the pipeline stops before model fitting.
    #[error("No data returned for {0}. Check the symbol or the start date.")]
    NoData(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Chart error: {0}")]
    Chart(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type with the dashboard error
pub type Result<T> = std::result::Result<T, DashboardError>;

impl From<csv::Error> for DashboardError {
    fn from(err: csv::Error) -> Self {
        DashboardError::Catalog(err.to_string())
    }
}

impl ResponseError for DashboardError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidHorizon(_) => StatusCode::BAD_REQUEST,
            Self::UnknownSymbol(_) | Self::NoData(_) => StatusCode::NOT_FOUND,
            Self::Http(_) | Self::Exchange { .. } | Self::UpstreamPayload(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(
            DashboardError::InvalidHorizon(10).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            DashboardError::NoData("BTCUSDT".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            DashboardError::Exchange { code: -1121, msg: "Invalid symbol.".into() }.status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            DashboardError::UpstreamPayload("truncated body".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            DashboardError::Model("too few rows".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn no_data_message_names_the_symbol() {
        let msg = DashboardError::NoData("ETHUSDT".into()).to_string();
        assert!(msg.contains("ETHUSDT"));
    }
}
