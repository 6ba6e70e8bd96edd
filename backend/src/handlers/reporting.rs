//! Reporting handlers for stock reports

use axum::{
    extract::{Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{ArchivedLotHistory, Lot, MaterialReference};

use crate::error::AppResult;
use crate::services::reporting::{PriceQuoteReport, ReferenceQuery};
use crate::AppState;

#[derive(Deserialize)]
pub struct LowStockQuery {
    pub threshold: Option<Decimal>,
}

#[derive(Deserialize)]
pub struct PriceQuoteQuery {
    pub diameter: Decimal,
    pub lot_number: Option<i64>,
    pub length: Option<Decimal>,
}

/// Get lots running low
pub async fn get_low_stock(
    State(state): State<AppState>,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Json<Vec<Lot>>> {
    let lots = state.reports().low_stock(query.threshold).await?;
    Ok(Json(lots))
}

/// Get consumption per dimension and material
pub async fn get_material_references(
    State(state): State<AppState>,
    Query(query): Query<ReferenceQuery>,
) -> AppResult<Json<Vec<MaterialReference>>> {
    let references = state.reports().material_references(&query).await?;
    Ok(Json(references))
}

/// Get price candidates for a diameter and, optionally, a quote
pub async fn get_price_quote(
    State(state): State<AppState>,
    Query(query): Query<PriceQuoteQuery>,
) -> AppResult<Json<PriceQuoteReport>> {
    let report = state
        .reports()
        .price_quote(query.diameter, query.lot_number, query.length)
        .await?;
    Ok(Json(report))
}

/// Get archived lots with their withdrawals
pub async fn get_archive_history(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ArchivedLotHistory>>> {
    let history = state.reports().archive_history().await?;
    Ok(Json(history))
}
