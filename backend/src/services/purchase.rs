//! Planned purchase service: stock the workshop intends to buy

use shared::validation::validate_lot_input;
use shared::{CreateLotInput, Lot, PlannedPurchase};
use uuid::Uuid;

use crate::config::StockConfig;
use crate::error::{AppError, AppResult};
use crate::repository::{Repositories, RepositoryError};

#[derive(Clone)]
pub struct PurchaseService {
    repos: Repositories,
    max_write_attempts: u32,
}

impl PurchaseService {
    pub fn new(repos: Repositories, config: &StockConfig) -> Self {
        Self {
            repos,
            max_write_attempts: config.max_write_attempts.max(1),
        }
    }

    /// Record a planned purchase; validated like a new lot
    pub async fn add(&self, input: CreateLotInput) -> AppResult<PlannedPurchase> {
        let draft = validate_lot_input(&input)?;
        let purchase = self.repos.purchases.create_purchase(&draft).await?;
        tracing::info!(purchase_id = %purchase.id, dimensions = %purchase.shape, "Purchase planned");
        Ok(purchase)
    }

    pub async fn list(&self) -> AppResult<Vec<PlannedPurchase>> {
        Ok(self.repos.purchases.list_purchases().await?)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.repos.purchases.delete_purchase(id).await? {
            return Err(AppError::NotFound(format!("Planned purchase {}", id)));
        }
        tracing::info!(purchase_id = %id, "Planned purchase deleted");
        Ok(())
    }

    /// Receive a planned purchase into stock as a new lot
    pub async fn transfer_to_stock(&self, id: Uuid) -> AppResult<Lot> {
        let mut attempt = 1;
        let lot = loop {
            match self.repos.purchases.transfer_purchase(id).await {
                Ok(Some(lot)) => break lot,
                Ok(None) => return Err(AppError::NotFound(format!("Planned purchase {}", id))),
                Err(RepositoryError::Conflict(msg)) if attempt < self.max_write_attempts => {
                    tracing::warn!(attempt, "Lot number taken concurrently, retrying: {}", msg);
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        };

        tracing::info!(purchase_id = %id, lot_number = lot.lot_number, "Planned purchase received");
        Ok(lot)
    }
}
