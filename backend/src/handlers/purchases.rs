//! HTTP handlers for planned purchases

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use shared::{CreateLotInput, Lot, PlannedPurchase};
use uuid::Uuid;

use crate::error::AppResult;
use crate::AppState;

pub async fn list_purchases(State(state): State<AppState>) -> AppResult<Json<Vec<PlannedPurchase>>> {
    let purchases = state.purchases().list().await?;
    Ok(Json(purchases))
}

pub async fn add_purchase(
    State(state): State<AppState>,
    Json(input): Json<CreateLotInput>,
) -> AppResult<(StatusCode, Json<PlannedPurchase>)> {
    let purchase = state.purchases().add(input).await?;
    Ok((StatusCode::CREATED, Json(purchase)))
}

pub async fn delete_purchase(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.purchases().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Receive a planned purchase into stock
pub async fn transfer_purchase(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<Lot>)> {
    let lot = state.purchases().transfer_to_stock(id).await?;
    Ok((StatusCode::CREATED, Json(lot)))
}
