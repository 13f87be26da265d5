// src/api/handlers.rs

use actix_web::error::{InternalError, QueryPayloadError};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::{error, warn};
use serde::Deserialize;
use serde_json::json;

use crate::api::AppStateStruct;
use crate::error::DashboardError;
use crate::pipeline::{run_dashboard, Horizon};

/// Query of `GET /api/forecast`; the coin is picked by display name or by ticker.
#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub horizon: Option<u32>,
}

pub async fn get_symbols(data: web::Data<AppStateStruct>) -> impl Responder {
    HttpResponse::Ok().json(data.catalog.entries())
}

pub async fn get_forecast(
    data: web::Data<AppStateStruct>,
    query: web::Query<ForecastQuery>,
) -> Result<HttpResponse, DashboardError> {
    let horizon = match query.horizon {
        Some(days) => Horizon::new(days)?,
        None => Horizon::default(),
    };

    let entry = match (&query.name, &query.symbol) {
        (Some(name), _) => data.catalog.find_by_name(name),
        (None, Some(symbol)) => data.catalog.find_by_symbol(symbol),
        (None, None) => None,
    }
    .cloned()
    .ok_or_else(|| {
        let requested = query
            .name
            .clone()
            .or_else(|| query.symbol.clone())
            .unwrap_or_default();
        DashboardError::UnknownSymbol(requested)
    })?;

    let source = data.source.clone();
    let config = data.config.clone();

    // The exchange client blocks, so the pipeline runs off the reactor.
    let report = tokio::task::spawn_blocking(move || {
        run_dashboard(source.as_ref(), &config, &entry, horizon)
    })
    .await
    .map_err(|e| {
        error!("Dashboard worker panicked: {}", e);
        DashboardError::Model(format!("forecast worker failed: {}", e))
    })??;

    Ok(HttpResponse::Ok().json(report))
}

/// Malformed query strings get the same `{"error": ...}` body as other failures.
fn query_error(err: QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    warn!("Rejected query {:?}: {}", req.query_string(), err);
    let body = json!({ "error": format!("Invalid query: {}", err) });
    InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
}

/// Registers the JSON API routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(query_error))
        .route("/api/symbols", web::get().to(get_symbols))
        .route("/api/forecast", web::get().to(get_forecast));
}
