//! Bar Stock Ledger - Backend Server
//!
//! Tracks raw-material stock (bars, rods and sheets) by lot: receiving,
//! withdrawals, archival and the reports built on them.

use axum::{routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod error;
mod handlers;
mod repository;
mod routes;
mod services;

pub use crate::config::Config;

use crate::config::{LogFormat, StorageBackend};
use crate::repository::Repositories;
use crate::services::{PurchaseService, ReportingService, StockLedger};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn ledger(&self) -> StockLedger {
        StockLedger::new(self.repos.clone(), &self.config.stock)
    }

    pub fn reports(&self) -> ReportingService {
        ReportingService::new(self.repos.clone(), &self.config.stock)
    }

    pub fn purchases(&self) -> PurchaseService {
        PurchaseService::new(self.repos.clone(), &self.config.stock)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "barstock_server=debug,tower_http=debug,sqlx=warn".into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.log.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!("Starting Bar Stock Ledger Server");
    tracing::info!("Environment: {}", config.environment);

    let repos = match config.storage.backend {
        StorageBackend::Postgres => {
            // Create database connection pool
            tracing::info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .acquire_timeout(Duration::from_secs(30))
                .connect(&config.database.url)
                .await?;

            tracing::info!("Database connection established");

            // Run migrations in development
            if config.is_development() {
                tracing::info!("Running database migrations...");
                sqlx::migrate!("./migrations").run(&db_pool).await?;
                tracing::info!("Migrations completed");
            }

            Repositories::postgres(db_pool)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using the in-memory store, stock is lost on shutdown");
            Repositories::in_memory()
        }
    };

    // Create application state
    let state = AppState {
        repos,
        config: Arc::new(config.clone()),
    };

    // Build application
    let app = create_app(state);

    // Start server
    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}

/// Create the application router with all routes and middleware
fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Bar Stock Ledger API v1"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        create_app(AppState {
            repos: Repositories::in_memory(),
            config: Arc::new(Config::in_memory()),
        })
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        app.clone().oneshot(request.body(body).unwrap()).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn steel_bar(supplier: &str) -> Value {
        json!({
            "type": "rectangular",
            "width": "20",
            "height": "30",
            "length": "1000",
            "material": "Steel",
            "supplier": supplier,
            "unit_price": "100"
        })
    }

    #[tokio::test]
    async fn test_health() {
        let app = app();
        let response = send(&app, "GET", "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["storage"], "connected");
    }

    #[tokio::test]
    async fn test_create_and_withdraw() {
        let app = app();
        let created = send(&app, "POST", "/api/v1/lots", Some(steel_bar("A"))).await;
        assert_eq!(created.status(), StatusCode::CREATED);
        assert_eq!(json_body(created).await["lot_number"], 1);

        let withdrawn = send(
            &app,
            "POST",
            "/api/v1/lots/1/withdrawals",
            Some(json!({ "mode": "remove_amount", "amount": "300", "reference": "REF1" })),
        )
        .await;
        assert_eq!(withdrawn.status(), StatusCode::CREATED);
        let receipt = json_body(withdrawn).await;
        assert_eq!(receipt["remaining_length"], "700");
        assert_eq!(receipt["withdrawal"]["value_at_withdrawal"], "30.00");

        let lot = json_body(send(&app, "GET", "/api/v1/lots/1", None).await).await;
        assert_eq!(lot["remaining_length"], "700");
    }

    #[tokio::test]
    async fn test_error_responses() {
        let app = app();
        let invalid = send(
            &app,
            "POST",
            "/api/v1/lots",
            Some(json!({ "type": "circular", "length": "100", "material": "Steel" })),
        )
        .await;
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
        let body = json_body(invalid).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["field"], "diameter,supplier");

        send(&app, "POST", "/api/v1/lots", Some(steel_bar("A"))).await;
        let too_much = send(
            &app,
            "POST",
            "/api/v1/lots/1/withdrawals",
            Some(json!({ "mode": "set_remaining", "amount": "1200", "reference": "REF1" })),
        )
        .await;
        assert_eq!(too_much.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(too_much).await["error"]["code"], "INVALID_QUANTITY");

        let missing = send(&app, "GET", "/api/v1/lots/42", None).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unvaluable_withdrawal_is_reported() {
        let app = app();
        let mut bar = steel_bar("A");
        bar["unit_price"] = json!(rust_decimal::Decimal::MAX.to_string());
        let created = send(&app, "POST", "/api/v1/lots", Some(bar)).await;
        assert_eq!(created.status(), StatusCode::CREATED);

        let withdrawn = send(
            &app,
            "POST",
            "/api/v1/lots/1/withdrawals",
            Some(json!({ "mode": "remove_amount", "amount": "300", "reference": "REF1" })),
        )
        .await;
        assert_eq!(withdrawn.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let lot = json_body(send(&app, "GET", "/api/v1/lots/1", None).await).await;
        assert_eq!(lot["remaining_length"], "1000");
    }

    #[tokio::test]
    async fn test_archive_moves_lot_out_of_stock_list() {
        let app = app();
        send(&app, "POST", "/api/v1/lots", Some(steel_bar("A"))).await;
        send(&app, "POST", "/api/v1/lots", Some(steel_bar("B"))).await;

        for _ in 0..2 {
            let archived = send(&app, "POST", "/api/v1/lots/1/archive", None).await;
            assert_eq!(archived.status(), StatusCode::OK);
        }

        let active = json_body(send(&app, "GET", "/api/v1/lots", None).await).await;
        assert_eq!(active.as_array().unwrap().len(), 1);
        let archived = json_body(send(&app, "GET", "/api/v1/lots?archived=true", None).await).await;
        assert_eq!(archived[0]["lot_number"], 1);

        let history = json_body(send(&app, "GET", "/api/v1/reports/archives", None).await).await;
        assert_eq!(history[0]["lot"]["lot_number"], 1);
    }

    #[tokio::test]
    async fn test_reports() {
        let app = app();
        send(&app, "POST", "/api/v1/lots", Some(steel_bar("A"))).await;
        send(&app, "POST", "/api/v1/lots", Some(steel_bar("B"))).await;
        send(
            &app,
            "POST",
            "/api/v1/lots/2/withdrawals",
            Some(json!({ "mode": "set_remaining", "amount": "150", "reference": "REF2" })),
        )
        .await;

        let low = json_body(send(&app, "GET", "/api/v1/reports/low-stock", None).await).await;
        assert_eq!(low.as_array().unwrap().len(), 1);
        assert_eq!(low[0]["lot_number"], 2);

        let refs = json_body(
            send(
                &app,
                "GET",
                "/api/v1/reports/material-references?sort=total_consumed&direction=desc",
                None,
            )
            .await,
        )
        .await;
        assert_eq!(refs[0]["suppliers"], json!(["A", "B"]));
        assert_eq!(refs[0]["total_consumed"], "850");

        let csv = send(&app, "GET", "/api/v1/withdrawals?format=csv", None).await;
        assert_eq!(csv.headers()[header::CONTENT_TYPE], "text/csv");
    }

    #[tokio::test]
    async fn test_price_quote_endpoint() {
        let app = app();
        send(
            &app,
            "POST",
            "/api/v1/lots",
            Some(json!({
                "type": "circular",
                "diameter": "20",
                "length": "1000",
                "material": "Brass",
                "supplier": "C",
                "unit_price": "50"
            })),
        )
        .await;

        let report = json_body(
            send(
                &app,
                "GET",
                "/api/v1/reports/price-quote?diameter=20&lot_number=1&length=200",
                None,
            )
            .await,
        )
        .await;
        assert_eq!(report["candidates"].as_array().unwrap().len(), 1);
        assert_eq!(report["quote"]["quoted_price"], "13.00");
    }

    #[tokio::test]
    async fn test_planned_purchase_flow() {
        let app = app();
        let created = send(&app, "POST", "/api/v1/planned-purchases", Some(steel_bar("A"))).await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let id = json_body(created).await["id"].as_str().unwrap().to_string();

        let transferred = send(
            &app,
            "POST",
            &format!("/api/v1/planned-purchases/{}/transfer", id),
            None,
        )
        .await;
        assert_eq!(transferred.status(), StatusCode::CREATED);
        assert_eq!(json_body(transferred).await["lot_number"], 1);

        let gone = send(&app, "DELETE", &format!("/api/v1/planned-purchases/{}", id), None).await;
        assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    }
}
