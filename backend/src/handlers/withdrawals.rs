//! Withdrawal history handlers

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use shared::WithdrawalFilter;

use crate::error::AppResult;
use crate::services::reporting::{ReportingService, WithdrawalCsvRow};
use crate::AppState;

#[derive(Deserialize)]
pub struct WithdrawalQuery {
    pub lot_number: Option<i64>,
    pub format: Option<String>, // "json" or "csv"
}

/// Get withdrawal history, newest first
pub async fn list_withdrawals(
    State(state): State<AppState>,
    Query(query): Query<WithdrawalQuery>,
) -> AppResult<impl IntoResponse> {
    let filter = WithdrawalFilter {
        lot_number: query.lot_number,
    };
    let withdrawals = state.reports().list_withdrawals(filter).await?;

    if query.format.as_deref() == Some("csv") {
        let rows: Vec<WithdrawalCsvRow> = withdrawals.iter().map(WithdrawalCsvRow::from).collect();
        let csv = ReportingService::export_to_csv(&rows)?;
        Ok((
            [(header::CONTENT_TYPE, "text/csv"), (header::CONTENT_DISPOSITION, "attachment; filename=\"withdrawals.csv\"")],
            csv,
        ).into_response())
    } else {
        Ok(Json(withdrawals).into_response())
    }
}
