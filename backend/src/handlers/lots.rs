//! HTTP handlers for lot endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::{CreateLotInput, Lot, LotFilter, LotSearch, WithdrawInput};

use crate::error::AppResult;
use crate::services::ledger::WithdrawalReceipt;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LotQuery {
    pub archived: Option<bool>,
    pub dimensions: Option<String>,
    pub material: Option<String>,
    pub supplier: Option<String>,
}

/// List lots; active ones unless `archived` says otherwise
pub async fn list_lots(
    State(state): State<AppState>,
    Query(query): Query<LotQuery>,
) -> AppResult<Json<Vec<Lot>>> {
    let filter = LotFilter {
        archived: Some(query.archived.unwrap_or(false)),
    };
    let search = LotSearch {
        dimensions: query.dimensions,
        material: query.material,
        supplier: query.supplier,
    };
    let lots = state.ledger().list_lots(filter, &search).await?;
    Ok(Json(lots))
}

/// Add a lot to stock
pub async fn create_lot(
    State(state): State<AppState>,
    Json(input): Json<CreateLotInput>,
) -> AppResult<(StatusCode, Json<Lot>)> {
    let lot = state.ledger().create_lot(input).await?;
    Ok((StatusCode::CREATED, Json(lot)))
}

/// Get a lot by number, archived included
pub async fn get_lot(
    State(state): State<AppState>,
    Path(lot_number): Path<i64>,
) -> AppResult<Json<Lot>> {
    let lot = state.ledger().get_lot(lot_number).await?;
    Ok(Json(lot))
}

/// Withdraw length from a lot
pub async fn withdraw(
    State(state): State<AppState>,
    Path(lot_number): Path<i64>,
    Json(input): Json<WithdrawInput>,
) -> AppResult<(StatusCode, Json<WithdrawalReceipt>)> {
    let receipt = state.ledger().withdraw(lot_number, input).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Archive a lot
pub async fn archive_lot(
    State(state): State<AppState>,
    Path(lot_number): Path<i64>,
) -> AppResult<Json<Lot>> {
    let lot = state.ledger().archive(lot_number).await?;
    Ok(Json(lot))
}
