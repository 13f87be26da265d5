use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use chrono::NaiveDate;
use serde_json::Value;

use crypto_forecast_dashboard::api::{self, AppStateStruct};
use crypto_forecast_dashboard::config::{AppConfig, ModelConfig};
use crypto_forecast_dashboard::models::Candle;
use crypto_forecast_dashboard::utils::{KlineInterval, MarketDataSource, SymbolCatalog};
use crypto_forecast_dashboard::Result;

const CATALOG: &str = "snome,symbol\nBitcoin,BTCUSDT\nEthereum,ETHUSDT\n";

/// Serves a synthetic uptrend for BTCUSDT and nothing for any other symbol.
struct StubExchange;

impl MarketDataSource for StubExchange {
    fn fetch_klines(&self, symbol: &str, _interval: KlineInterval, _start: NaiveDate) -> Result<Vec<Candle>> {
        if symbol != "BTCUSDT" {
            return Ok(Vec::new());
        }
        let base = 1_672_531_200_000_i64; // 2023-01-01
        Ok((0..90)
            .map(|i| {
                let close = 20_000.0 + 50.0 * i as f64;
                Candle {
                    open_time: base + i * 86_400_000,
                    open: close - 10.0,
                    high: close + 100.0,
                    low: close - 100.0,
                    close,
                    volume: 500.0 + i as f64,
                    close_time: base + (i + 1) * 86_400_000 - 1,
                    quote_volume: close * 500.0,
                    trades: 1000,
                }
            })
            .collect())
    }
}

fn state() -> web::Data<AppStateStruct> {
    let config = AppConfig {
        model: ModelConfig {
            uncertainty_samples: 50,
            ..ModelConfig::default()
        },
        ..AppConfig::default()
    };
    web::Data::new(AppStateStruct {
        config: Arc::new(config),
        catalog: Arc::new(SymbolCatalog::from_reader(CATALOG.as_bytes()).unwrap()),
        source: Arc::new(StubExchange),
    })
}

#[actix_web::test]
async fn lists_symbols() {
    let app = test::init_service(App::new().app_data(state()).configure(api::configure)).await;
    let req = test::TestRequest::get().uri("/api/symbols").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["snome"], "Bitcoin");
    assert_eq!(entries[1]["symbol"], "ETHUSDT");
}

#[actix_web::test]
async fn forecast_by_name() {
    let app = test::init_service(App::new().app_data(state()).configure(api::configure)).await;
    let req = test::TestRequest::get()
        .uri("/api/forecast?name=Bitcoin&horizon=60")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["symbol"], "BTCUSDT");
    assert_eq!(body["horizon"], 60);
    assert_eq!(body["forecast"].as_array().unwrap().len(), 60);
    assert_eq!(body["history_tail"].as_array().unwrap().len(), 5);

    let insights = body["insights"].as_array().unwrap();
    assert_eq!(insights.len(), 10);
    for row in insights {
        let signal = row["signal"].as_str().unwrap();
        assert!(["Buy", "Sell", "Hold"].contains(&signal));
    }
    assert!(body["metrics"]["mae"].as_f64().unwrap() >= 0.0);
}

#[actix_web::test]
async fn forecast_by_symbol_uses_default_horizon() {
    let app = test::init_service(App::new().app_data(state()).configure(api::configure)).await;
    let req = test::TestRequest::get().uri("/api/forecast?symbol=btcusdt").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["horizon"], 30);
    assert_eq!(body["forecast"].as_array().unwrap().len(), 30);
}

#[actix_web::test]
async fn empty_upstream_is_reported() {
    let app = test::init_service(App::new().app_data(state()).configure(api::configure)).await;
    let req = test::TestRequest::get().uri("/api/forecast?name=Ethereum").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("ETHUSDT"));
}

#[actix_web::test]
async fn horizon_out_of_range_is_rejected() {
    let app = test::init_service(App::new().app_data(state()).configure(api::configure)).await;
    for horizon in [29, 366] {
        let req = test::TestRequest::get()
            .uri(&format!("/api/forecast?name=Bitcoin&horizon={}", horizon))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

#[actix_web::test]
async fn unknown_coin_is_not_found() {
    let app = test::init_service(App::new().app_data(state()).configure(api::configure)).await;
    let req = test::TestRequest::get().uri("/api/forecast?name=Dogecoin").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get().uri("/api/forecast").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn malformed_query_gets_json_error() {
    let app = test::init_service(App::new().app_data(state()).configure(api::configure)).await;
    for query in ["horizon=abc", "horizon=-1"] {
        let req = test::TestRequest::get()
            .uri(&format!("/api/forecast?name=Bitcoin&{}", query))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().starts_with("Invalid query"));
    }
}
