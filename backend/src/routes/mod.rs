//! Route definitions for the bar stock ledger

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Stock
        .nest("/lots", lot_routes())
        // History
        .route("/withdrawals", get(handlers::list_withdrawals))
        // Reports
        .nest("/reports", report_routes())
        // Future purchases
        .nest("/planned-purchases", purchase_routes())
}

/// Lot routes
fn lot_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_lots).post(handlers::create_lot))
        .route("/:lot_number", get(handlers::get_lot))
        .route("/:lot_number/withdrawals", post(handlers::withdraw))
        .route("/:lot_number/archive", post(handlers::archive_lot))
}

/// Reporting routes
fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/low-stock", get(handlers::get_low_stock))
        .route("/material-references", get(handlers::get_material_references))
        .route("/price-quote", get(handlers::get_price_quote))
        .route("/archives", get(handlers::get_archive_history))
}

/// Planned purchase routes
fn purchase_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_purchases).post(handlers::add_purchase))
        .route("/:id", delete(handlers::delete_purchase))
        .route("/:id/transfer", post(handlers::transfer_purchase))
}
