//! Storage boundary for lots, withdrawals and planned purchases
//!
//! Services only see these traits. Invariants that need a single authority
//! (lot numbering, the withdrawal's two writes) are enforced by the
//! implementations, never by callers.

use std::sync::Arc;

use async_trait::async_trait;
use shared::{Lot, LotDraft, LotFilter, PlannedPurchase, Withdrawal, WithdrawalFilter, WithdrawalPlan};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStockRepository;
pub use postgres::PgStockRepository;

/// Storage failures; none of them leave a partial write behind
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// A concurrent write changed the record first
    #[error("{0}")]
    Conflict(String),

    /// The store could not be reached in time
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored row no longer decodes into a domain value
    #[error("invalid stored row: {0}")]
    InvalidRow(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::Conflict(format!("duplicate key: {}", db.message()))
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                RepositoryError::Unavailable(err.to_string())
            }
            other => RepositoryError::Database(other),
        }
    }
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Durable store of lots
#[async_trait]
pub trait LotRepository: Send + Sync {
    /// Lots matching `filter`, ascending lot number
    async fn list_lots(&self, filter: LotFilter) -> RepoResult<Vec<Lot>>;

    async fn find_lot(&self, lot_number: i64) -> RepoResult<Option<Lot>>;

    /// Store a new full lot under the next free lot number.
    ///
    /// Numbering and insertion happen under one authority, so concurrent
    /// callers never receive the same number.
    async fn create_lot(&self, draft: &LotDraft) -> RepoResult<Lot>;

    /// Mark a lot archived; archiving an archived lot is a no-op
    async fn archive_lot(&self, lot_number: i64) -> RepoResult<Option<Lot>>;

    /// Cheap round trip used by the health endpoint
    async fn ping(&self) -> RepoResult<()>;
}

/// Append-only store of withdrawal records
#[async_trait]
pub trait WithdrawalRepository: Send + Sync {
    /// Withdrawals matching `filter`, newest first
    async fn list_withdrawals(&self, filter: WithdrawalFilter) -> RepoResult<Vec<Withdrawal>>;

    /// Apply a planned withdrawal as one unit: the lot moves from
    /// `expected_remaining` to `new_remaining` and the record is appended.
    ///
    /// Fails with [`RepositoryError::Conflict`] and writes nothing when the
    /// lot no longer holds `expected_remaining` or has been archived.
    async fn record_withdrawal(&self, plan: &WithdrawalPlan) -> RepoResult<Withdrawal>;
}

/// Store of planned purchases
#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    /// Planned purchases, newest first
    async fn list_purchases(&self) -> RepoResult<Vec<PlannedPurchase>>;

    async fn create_purchase(&self, draft: &LotDraft) -> RepoResult<PlannedPurchase>;

    /// Returns false when nothing was deleted
    async fn delete_purchase(&self, id: Uuid) -> RepoResult<bool>;

    /// Turn a planned purchase into a lot with the next lot number and drop
    /// the purchase, as one unit. `None` when the purchase does not exist.
    async fn transfer_purchase(&self, id: Uuid) -> RepoResult<Option<Lot>>;
}

/// The repositories a request can reach
#[derive(Clone)]
pub struct Repositories {
    pub lots: Arc<dyn LotRepository>,
    pub withdrawals: Arc<dyn WithdrawalRepository>,
    pub purchases: Arc<dyn PurchaseRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self::from_store(Arc::new(PgStockRepository::new(pool)))
    }

    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(InMemoryStockRepository::new()))
    }

    /// Share one store across all three roles
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: LotRepository + WithdrawalRepository + PurchaseRepository + 'static,
    {
        Self {
            lots: store.clone(),
            withdrawals: store.clone(),
            purchases: store,
        }
    }
}
