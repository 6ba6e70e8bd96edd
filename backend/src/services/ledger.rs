//! Stock ledger service: lot creation, withdrawals and archival

use rust_decimal::Decimal;
use serde::Serialize;
use shared::ledger::{archive_expected, plan_withdrawal};
use shared::reporting::search_lots;
use shared::validation::validate_lot_input;
use shared::{CreateLotInput, Lot, LotDraft, LotFilter, LotSearch, StockError, WithdrawInput, Withdrawal};

use crate::config::StockConfig;
use crate::error::{AppError, AppResult};
use crate::repository::{Repositories, RepositoryError};

/// Applies quantity changes to lots through the repositories
#[derive(Clone)]
pub struct StockLedger {
    repos: Repositories,
    max_write_attempts: u32,
}

/// Outcome of a successful withdrawal
#[derive(Debug, Clone, Serialize)]
pub struct WithdrawalReceipt {
    pub lot_number: i64,
    pub remaining_length: Decimal,
    /// The lot is used up and can be archived
    pub archive_suggested: bool,
    pub withdrawal: Withdrawal,
}

impl StockLedger {
    pub fn new(repos: Repositories, config: &StockConfig) -> Self {
        Self {
            repos,
            max_write_attempts: config.max_write_attempts.max(1),
        }
    }

    /// Validate the input and store it as a new full lot
    pub async fn create_lot(&self, input: CreateLotInput) -> AppResult<Lot> {
        let draft = validate_lot_input(&input)?;
        let lot = self.create_from_draft(&draft).await?;

        tracing::info!(
            lot_number = lot.lot_number,
            dimensions = %lot.shape,
            material = %lot.material,
            "Lot created"
        );
        Ok(lot)
    }

    /// Store a validated draft, retrying when another writer took the number
    pub(crate) async fn create_from_draft(&self, draft: &LotDraft) -> AppResult<Lot> {
        let mut attempt = 1;
        loop {
            match self.repos.lots.create_lot(draft).await {
                Ok(lot) => return Ok(lot),
                Err(RepositoryError::Conflict(msg)) if attempt < self.max_write_attempts => {
                    tracing::warn!(attempt, "Lot number taken concurrently, retrying: {}", msg);
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Withdraw length from an active lot.
    ///
    /// The lot is re-read and the request re-validated whenever a concurrent
    /// write lands between our read and our write.
    pub async fn withdraw(&self, lot_number: i64, input: WithdrawInput) -> AppResult<WithdrawalReceipt> {
        let mut attempt = 1;
        loop {
            let lot = self.get_active_lot(lot_number).await?;
            let plan = plan_withdrawal(&lot, &input)?;

            match self.repos.withdrawals.record_withdrawal(&plan).await {
                Ok(withdrawal) => {
                    let archive_suggested = plan.new_remaining.is_zero();
                    tracing::info!(
                        lot_number,
                        quantity_removed = %withdrawal.quantity_removed,
                        remaining_length = %plan.new_remaining,
                        value = %withdrawal.value_at_withdrawal,
                        attempt,
                        "Withdrawal recorded"
                    );
                    return Ok(WithdrawalReceipt {
                        lot_number,
                        remaining_length: plan.new_remaining,
                        archive_suggested,
                        withdrawal,
                    });
                }
                Err(RepositoryError::Conflict(msg)) if attempt < self.max_write_attempts => {
                    tracing::warn!(lot_number, attempt, "Withdrawal raced another write: {}", msg);
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Archive a lot; archiving twice leaves it archived
    pub async fn archive(&self, lot_number: i64) -> AppResult<Lot> {
        let lot = self
            .repos
            .lots
            .archive_lot(lot_number)
            .await?
            .ok_or(StockError::NotFound { lot_number })?;

        if archive_expected(&lot) {
            tracing::info!(lot_number, "Lot archived");
        } else {
            tracing::info!(
                lot_number,
                remaining_length = %lot.remaining_length,
                "Lot archived with material left"
            );
        }
        Ok(lot)
    }

    /// Any lot, archived included
    pub async fn get_lot(&self, lot_number: i64) -> AppResult<Lot> {
        self.repos
            .lots
            .find_lot(lot_number)
            .await?
            .ok_or_else(|| StockError::NotFound { lot_number }.into())
    }

    async fn get_active_lot(&self, lot_number: i64) -> AppResult<Lot> {
        match self.get_lot(lot_number).await? {
            lot if lot.archived => Err(AppError::from(StockError::NotFound { lot_number })),
            lot => Ok(lot),
        }
    }

    /// List lots by archived flag, narrowed by a non-empty search
    pub async fn list_lots(&self, filter: LotFilter, search: &LotSearch) -> AppResult<Vec<Lot>> {
        let lots = self.repos.lots.list_lots(filter).await?;
        if search.is_empty() {
            return Ok(lots);
        }
        Ok(search_lots(&lots, search))
    }
}
