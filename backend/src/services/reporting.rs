//! Reporting service for stock reports and history export
//! Provides low stock, material references, price quotes and archive history

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::reporting::{
    archive_history, filter_references, low_stock, material_references, price_candidates,
    price_quote, sort_references,
};
use shared::{
    ArchivedLotHistory, Lot, LotFilter, MaterialReference, PriceQuote, ReferenceSort,
    SortDirection, Withdrawal, WithdrawalFilter,
};

use crate::config::StockConfig;
use crate::error::{AppError, AppResult};
use crate::repository::Repositories;

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    repos: Repositories,
    low_stock_threshold: Decimal,
    price_margin: Decimal,
}

/// Material reference report parameters
#[derive(Debug, Default, Deserialize)]
pub struct ReferenceQuery {
    #[serde(default)]
    pub sort: ReferenceSort,
    #[serde(default)]
    pub direction: SortDirection,
    pub search: Option<String>,
}

/// Price lookup for a diameter, with a quote once a lot and length are chosen
#[derive(Debug, Serialize)]
pub struct PriceQuoteReport {
    pub diameter: Decimal,
    pub candidates: Vec<Lot>,
    pub quote: Option<PriceQuote>,
}

/// Flat withdrawal history row for CSV export
#[derive(Debug, Serialize)]
pub struct WithdrawalCsvRow {
    pub timestamp: DateTime<Utc>,
    pub lot_number: i64,
    pub reference: String,
    pub material: String,
    pub dimensions: String,
    pub supplier: String,
    pub quantity_removed: Decimal,
    pub value_at_withdrawal: Decimal,
    pub piece_name: Option<String>,
    pub piece_quantity: Option<i32>,
}

impl From<&Withdrawal> for WithdrawalCsvRow {
    fn from(w: &Withdrawal) -> Self {
        Self {
            timestamp: w.timestamp,
            lot_number: w.lot_number,
            reference: w.reference.clone(),
            material: w.material.clone(),
            dimensions: w.dimensions.clone(),
            supplier: w.supplier.clone(),
            quantity_removed: w.quantity_removed,
            value_at_withdrawal: w.value_at_withdrawal,
            piece_name: w.piece_info.as_ref().map(|p| p.name.clone()),
            piece_quantity: w.piece_info.as_ref().map(|p| p.quantity),
        }
    }
}

impl ReportingService {
    pub fn new(repos: Repositories, config: &StockConfig) -> Self {
        Self {
            repos,
            low_stock_threshold: config.low_stock_threshold,
            price_margin: config.price_margin,
        }
    }

    /// Active lots at or below the threshold (configured default when omitted)
    pub async fn low_stock(&self, threshold: Option<Decimal>) -> AppResult<Vec<Lot>> {
        let threshold = threshold.unwrap_or(self.low_stock_threshold);
        if threshold < Decimal::ZERO {
            return Err(AppError::validation("threshold", "Threshold cannot be negative"));
        }

        let lots = self.repos.lots.list_lots(LotFilter::active()).await?;
        Ok(low_stock(&lots, threshold))
    }

    /// Consumption per dimension and material across every lot
    pub async fn material_references(&self, query: &ReferenceQuery) -> AppResult<Vec<MaterialReference>> {
        let lots = self.repos.lots.list_lots(LotFilter::all()).await?;
        let withdrawals = self
            .repos
            .withdrawals
            .list_withdrawals(WithdrawalFilter::default())
            .await?;

        let mut references = material_references(&lots, &withdrawals);
        sort_references(&mut references, query.sort, query.direction);

        tracing::debug!(
            groups = references.len(),
            sort = query.sort.as_str(),
            "Material references computed"
        );

        Ok(match query.search.as_deref() {
            Some(term) => filter_references(references, term),
            None => references,
        })
    }

    /// Candidate lots for `diameter`, quoted when a lot and length are given
    pub async fn price_quote(
        &self,
        diameter: Decimal,
        lot_number: Option<i64>,
        desired_length: Option<Decimal>,
    ) -> AppResult<PriceQuoteReport> {
        if diameter <= Decimal::ZERO {
            return Err(AppError::validation("diameter", "Diameter must be positive"));
        }
        if matches!(desired_length, Some(l) if l <= Decimal::ZERO) {
            return Err(AppError::validation("length", "Length must be positive"));
        }

        let lots = self.repos.lots.list_lots(LotFilter::active()).await?;
        let candidates = price_candidates(&lots, diameter);

        let quote = match lot_number {
            Some(n) => {
                let lot = candidates.iter().find(|l| l.lot_number == n).ok_or_else(|| {
                    AppError::NotFound(format!("Circular lot {} with diameter {}", n, diameter))
                })?;
                price_quote(lot, desired_length, self.price_margin)?
            }
            None => None,
        };

        Ok(PriceQuoteReport {
            diameter,
            candidates,
            quote,
        })
    }

    /// Archived lots with the withdrawals taken from each
    pub async fn archive_history(&self) -> AppResult<Vec<ArchivedLotHistory>> {
        let lots = self.repos.lots.list_lots(LotFilter::archived()).await?;
        let withdrawals = self
            .repos
            .withdrawals
            .list_withdrawals(WithdrawalFilter::default())
            .await?;
        Ok(archive_history(&lots, &withdrawals))
    }

    /// Withdrawal history, newest first
    pub async fn list_withdrawals(&self, filter: WithdrawalFilter) -> AppResult<Vec<Withdrawal>> {
        Ok(self.repos.withdrawals.list_withdrawals(filter).await?)
    }

    /// Export report data as CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record).map_err(|e| {
                AppError::Internal(format!("CSV serialization error: {}", e))
            })?;
        }
        let csv_data = String::from_utf8(wtr.into_inner().map_err(|e| {
            AppError::Internal(format!("CSV writer error: {}", e))
        })?)
        .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))?;
        Ok(csv_data)
    }
}
