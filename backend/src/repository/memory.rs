use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use shared::ledger::next_lot_number;
use shared::{
    Lot, LotDraft, LotFilter, PlannedPurchase, Withdrawal, WithdrawalFilter, WithdrawalPlan,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    LotRepository, PurchaseRepository, RepoResult, RepositoryError, WithdrawalRepository,
};

#[derive(Debug, Default)]
struct Tables {
    lots: BTreeMap<i64, Lot>,
    withdrawals: Vec<Withdrawal>,
    purchases: Vec<PlannedPurchase>,
}

impl Tables {
    fn insert_lot(&mut self, draft: &LotDraft) -> Lot {
        let lot_number = next_lot_number(self.lots.values());
        let lot = Lot::from_draft(lot_number, draft, Utc::now());
        self.lots.insert(lot_number, lot.clone());
        lot
    }
}

/// In-memory stock store.
///
/// Every write takes the single write lock, which makes it the numbering
/// authority and keeps a withdrawal's two writes together. Intended for
/// tests and local runs.
#[derive(Debug, Default)]
pub struct InMemoryStockRepository {
    tables: RwLock<Tables>,
}

impl InMemoryStockRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LotRepository for InMemoryStockRepository {
    async fn list_lots(&self, filter: LotFilter) -> RepoResult<Vec<Lot>> {
        let tables = self.tables.read().await;
        Ok(tables
            .lots
            .values()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect())
    }

    async fn find_lot(&self, lot_number: i64) -> RepoResult<Option<Lot>> {
        Ok(self.tables.read().await.lots.get(&lot_number).cloned())
    }

    async fn create_lot(&self, draft: &LotDraft) -> RepoResult<Lot> {
        let mut tables = self.tables.write().await;
        Ok(tables.insert_lot(draft))
    }

    async fn archive_lot(&self, lot_number: i64) -> RepoResult<Option<Lot>> {
        let mut tables = self.tables.write().await;
        Ok(tables.lots.get_mut(&lot_number).map(|lot| {
            lot.archived = true;
            lot.clone()
        }))
    }

    async fn ping(&self) -> RepoResult<()> {
        Ok(())
    }
}

#[async_trait]
impl WithdrawalRepository for InMemoryStockRepository {
    async fn list_withdrawals(&self, filter: WithdrawalFilter) -> RepoResult<Vec<Withdrawal>> {
        let tables = self.tables.read().await;
        let mut found: Vec<Withdrawal> = tables
            .withdrawals
            .iter()
            .filter(|w| filter.matches(w))
            .cloned()
            .collect();
        found.sort_by(shared::reporting::newest_first);
        Ok(found)
    }

    async fn record_withdrawal(&self, plan: &WithdrawalPlan) -> RepoResult<Withdrawal> {
        let mut tables = self.tables.write().await;
        let lot_number = plan.record.lot_number;

        let lot = tables
            .lots
            .get_mut(&lot_number)
            .filter(|l| !l.archived && l.remaining_length == plan.expected_remaining)
            .ok_or_else(|| {
                RepositoryError::Conflict(format!(
                    "Lot {} changed before the withdrawal was written",
                    lot_number
                ))
            })?;
        lot.remaining_length = plan.new_remaining;

        let withdrawal = Withdrawal::from_draft(Uuid::new_v4(), &plan.record, Utc::now());
        tables.withdrawals.push(withdrawal.clone());
        Ok(withdrawal)
    }
}

#[async_trait]
impl PurchaseRepository for InMemoryStockRepository {
    async fn list_purchases(&self) -> RepoResult<Vec<PlannedPurchase>> {
        let tables = self.tables.read().await;
        let mut purchases = tables.purchases.clone();
        purchases.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(purchases)
    }

    async fn create_purchase(&self, draft: &LotDraft) -> RepoResult<PlannedPurchase> {
        let purchase = PlannedPurchase::from_draft(Uuid::new_v4(), draft, Utc::now());
        self.tables.write().await.purchases.push(purchase.clone());
        Ok(purchase)
    }

    async fn delete_purchase(&self, id: Uuid) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.purchases.len();
        tables.purchases.retain(|p| p.id != id);
        Ok(tables.purchases.len() != before)
    }

    async fn transfer_purchase(&self, id: Uuid) -> RepoResult<Option<Lot>> {
        let mut tables = self.tables.write().await;
        let Some(index) = tables.purchases.iter().position(|p| p.id == id) else {
            return Ok(None);
        };
        let purchase = tables.purchases.remove(index);
        Ok(Some(tables.insert_lot(&purchase.to_draft())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::ledger::plan_withdrawal;
    use shared::{Shape, WithdrawInput, WithdrawalMode};

    fn draft() -> LotDraft {
        LotDraft {
            shape: Shape::Rectangular {
                width: Decimal::from(20),
                height: Decimal::from(30),
            },
            original_length: Decimal::from(1000),
            material: "Steel".to_string(),
            supplier: "A".to_string(),
            unit_price: Some(Decimal::from(100)),
        }
    }

    fn remove(amount: i64) -> WithdrawInput {
        WithdrawInput {
            mode: WithdrawalMode::RemoveAmount,
            amount: Decimal::from(amount),
            reference: "REF".to_string(),
            piece_info: None,
        }
    }

    #[tokio::test]
    async fn test_lot_numbers_continue_after_archived() {
        let repo = InMemoryStockRepository::new();
        let first = repo.create_lot(&draft()).await.unwrap();
        repo.archive_lot(first.lot_number).await.unwrap();
        let second = repo.create_lot(&draft()).await.unwrap();

        assert_eq!(first.lot_number, 1);
        assert_eq!(second.lot_number, 2);
        assert_eq!(repo.list_lots(LotFilter::active()).await.unwrap().len(), 1);
        assert_eq!(repo.list_lots(LotFilter::all()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_stale_plan_is_a_conflict() {
        let repo = InMemoryStockRepository::new();
        let lot = repo.create_lot(&draft()).await.unwrap();

        let first = plan_withdrawal(&lot, &remove(100)).unwrap();
        let stale = plan_withdrawal(&lot, &remove(200)).unwrap();
        repo.record_withdrawal(&first).await.unwrap();

        let result = repo.record_withdrawal(&stale).await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));

        let stored = repo.find_lot(lot.lot_number).await.unwrap().unwrap();
        assert_eq!(stored.remaining_length, Decimal::from(900));
        assert_eq!(
            repo.list_withdrawals(WithdrawalFilter::default())
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_transfer_purchase_creates_lot() {
        let repo = InMemoryStockRepository::new();
        repo.create_lot(&draft()).await.unwrap();
        let purchase = repo.create_purchase(&draft()).await.unwrap();

        let lot = repo.transfer_purchase(purchase.id).await.unwrap().unwrap();
        assert_eq!(lot.lot_number, 2);
        assert_eq!(lot.remaining_length, Decimal::from(1000));
        assert!(repo.list_purchases().await.unwrap().is_empty());
        assert!(repo.transfer_purchase(purchase.id).await.unwrap().is_none());
    }
}
