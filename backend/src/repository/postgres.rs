//! PostgreSQL stock store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{
    Lot, LotDraft, LotFilter, PieceInfo, PlannedPurchase, Shape, ShapeKind, Withdrawal,
    WithdrawalFilter, WithdrawalPlan,
};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{
    LotRepository, PurchaseRepository, RepoResult, RepositoryError, WithdrawalRepository,
};

/// Advisory lock key serializing lot number assignment
const LOT_NUMBER_LOCK: i64 = 0x6261_7273_746f_636b;

const LOT_COLUMNS: &str = "lot_number, shape_type, width, height, diameter, original_length, \
     remaining_length, material, supplier, unit_price, archived, created_at";

const WITHDRAWAL_COLUMNS: &str = "id, lot_number, quantity_removed, reference, timestamp, \
     value_at_withdrawal, piece_name, piece_quantity, material, dimensions, supplier, shape";

const PURCHASE_COLUMNS: &str =
    "id, shape_type, width, height, diameter, length, material, supplier, unit_price, created_at";

/// Stock store backed by a Postgres pool
#[derive(Clone)]
pub struct PgStockRepository {
    db: PgPool,
}

impl PgStockRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Number and insert a lot inside `tx`, holding the numbering lock until commit
    async fn insert_lot(tx: &mut Transaction<'_, Postgres>, draft: &LotDraft) -> RepoResult<Lot> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(LOT_NUMBER_LOCK)
            .execute(&mut **tx)
            .await?;

        let lot_number: i64 =
            sqlx::query_scalar("SELECT COALESCE(MAX(lot_number), 0) + 1 FROM lots")
                .fetch_one(&mut **tx)
                .await?;

        let (shape_type, width, height, diameter) = shape_columns(&draft.shape);
        let row = sqlx::query_as::<_, LotRow>(&format!(
            r#"
            INSERT INTO lots (lot_number, shape_type, width, height, diameter, original_length,
                              remaining_length, material, supplier, unit_price, archived, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6, $7, $8, $9, FALSE, $10)
            RETURNING {LOT_COLUMNS}
            "#
        ))
        .bind(lot_number)
        .bind(shape_type)
        .bind(width)
        .bind(height)
        .bind(diameter)
        .bind(draft.original_length)
        .bind(&draft.material)
        .bind(&draft.supplier)
        .bind(draft.unit_price)
        .bind(Utc::now())
        .fetch_one(&mut **tx)
        .await?;

        row.try_into()
    }
}

#[derive(Debug, FromRow)]
struct LotRow {
    lot_number: i64,
    shape_type: String,
    width: Option<Decimal>,
    height: Option<Decimal>,
    diameter: Option<Decimal>,
    original_length: Decimal,
    remaining_length: Decimal,
    material: String,
    supplier: String,
    unit_price: Option<Decimal>,
    archived: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<LotRow> for Lot {
    type Error = RepositoryError;

    fn try_from(row: LotRow) -> RepoResult<Self> {
        Ok(Lot {
            lot_number: row.lot_number,
            shape: shape_from_columns(&row.shape_type, row.width, row.height, row.diameter)?,
            original_length: row.original_length,
            remaining_length: row.remaining_length,
            material: row.material,
            supplier: row.supplier,
            unit_price: row.unit_price,
            archived: row.archived,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct WithdrawalRow {
    id: Uuid,
    lot_number: i64,
    quantity_removed: Decimal,
    reference: String,
    timestamp: DateTime<Utc>,
    value_at_withdrawal: Decimal,
    piece_name: Option<String>,
    piece_quantity: Option<i32>,
    material: String,
    dimensions: String,
    supplier: String,
    shape: Json<Shape>,
}

impl From<WithdrawalRow> for Withdrawal {
    fn from(row: WithdrawalRow) -> Self {
        let piece_info = match (row.piece_name, row.piece_quantity) {
            (Some(name), Some(quantity)) => Some(PieceInfo { name, quantity }),
            _ => None,
        };
        Withdrawal {
            id: row.id,
            lot_number: row.lot_number,
            quantity_removed: row.quantity_removed,
            reference: row.reference,
            timestamp: row.timestamp,
            value_at_withdrawal: row.value_at_withdrawal,
            piece_info,
            material: row.material,
            dimensions: row.dimensions,
            supplier: row.supplier,
            shape: row.shape.0,
        }
    }
}

#[derive(Debug, FromRow)]
struct PurchaseRow {
    id: Uuid,
    shape_type: String,
    width: Option<Decimal>,
    height: Option<Decimal>,
    diameter: Option<Decimal>,
    length: Decimal,
    material: String,
    supplier: String,
    unit_price: Option<Decimal>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PurchaseRow> for PlannedPurchase {
    type Error = RepositoryError;

    fn try_from(row: PurchaseRow) -> RepoResult<Self> {
        Ok(PlannedPurchase {
            id: row.id,
            shape: shape_from_columns(&row.shape_type, row.width, row.height, row.diameter)?,
            length: row.length,
            material: row.material,
            supplier: row.supplier,
            unit_price: row.unit_price,
            created_at: row.created_at,
        })
    }
}

fn shape_columns(shape: &Shape) -> (&'static str, Option<Decimal>, Option<Decimal>, Option<Decimal>) {
    let kind = shape.kind().as_str();
    match shape {
        Shape::Rectangular { width, height } => (kind, Some(*width), Some(*height), None),
        Shape::Circular { diameter } => (kind, None, None, Some(*diameter)),
    }
}

fn shape_from_columns(
    shape_type: &str,
    width: Option<Decimal>,
    height: Option<Decimal>,
    diameter: Option<Decimal>,
) -> RepoResult<Shape> {
    match (shape_type.parse::<ShapeKind>(), width, height, diameter) {
        (Ok(ShapeKind::Rectangular), Some(width), Some(height), _) => {
            Ok(Shape::Rectangular { width, height })
        }
        (Ok(ShapeKind::Circular), _, _, Some(diameter)) => Ok(Shape::Circular { diameter }),
        _ => Err(RepositoryError::InvalidRow(format!(
            "shape '{}' is missing its dimensions",
            shape_type
        ))),
    }
}

#[async_trait]
impl LotRepository for PgStockRepository {
    async fn list_lots(&self, filter: LotFilter) -> RepoResult<Vec<Lot>> {
        let rows = sqlx::query_as::<_, LotRow>(&format!(
            r#"
            SELECT {LOT_COLUMNS}
            FROM lots
            WHERE ($1::BOOLEAN IS NULL OR archived = $1)
            ORDER BY lot_number ASC
            "#
        ))
        .bind(filter.archived)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Lot::try_from).collect()
    }

    async fn find_lot(&self, lot_number: i64) -> RepoResult<Option<Lot>> {
        let row = sqlx::query_as::<_, LotRow>(&format!(
            "SELECT {LOT_COLUMNS} FROM lots WHERE lot_number = $1"
        ))
        .bind(lot_number)
        .fetch_optional(&self.db)
        .await?;

        row.map(Lot::try_from).transpose()
    }

    async fn create_lot(&self, draft: &LotDraft) -> RepoResult<Lot> {
        let mut tx = self.db.begin().await?;
        let lot = Self::insert_lot(&mut tx, draft).await?;
        tx.commit().await?;

        tracing::debug!(lot_number = lot.lot_number, "Lot row inserted");
        Ok(lot)
    }

    async fn archive_lot(&self, lot_number: i64) -> RepoResult<Option<Lot>> {
        let row = sqlx::query_as::<_, LotRow>(&format!(
            r#"
            UPDATE lots SET archived = TRUE
            WHERE lot_number = $1
            RETURNING {LOT_COLUMNS}
            "#
        ))
        .bind(lot_number)
        .fetch_optional(&self.db)
        .await?;

        row.map(Lot::try_from).transpose()
    }

    async fn ping(&self) -> RepoResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}

#[async_trait]
impl WithdrawalRepository for PgStockRepository {
    async fn list_withdrawals(&self, filter: WithdrawalFilter) -> RepoResult<Vec<Withdrawal>> {
        let rows = sqlx::query_as::<_, WithdrawalRow>(&format!(
            r#"
            SELECT {WITHDRAWAL_COLUMNS}
            FROM withdrawals
            WHERE ($1::BIGINT IS NULL OR lot_number = $1)
            ORDER BY timestamp DESC
            "#
        ))
        .bind(filter.lot_number)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Withdrawal::from).collect())
    }

    async fn record_withdrawal(&self, plan: &WithdrawalPlan) -> RepoResult<Withdrawal> {
        let record = &plan.record;
        let mut tx = self.db.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE lots SET remaining_length = $1
            WHERE lot_number = $2 AND remaining_length = $3 AND NOT archived
            "#,
        )
        .bind(plan.new_remaining)
        .bind(record.lot_number)
        .bind(plan.expected_remaining)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(RepositoryError::Conflict(format!(
                "Lot {} changed before the withdrawal was written",
                record.lot_number
            )));
        }

        let (piece_name, piece_quantity) = match &record.piece_info {
            Some(piece) => (Some(piece.name.as_str()), Some(piece.quantity)),
            None => (None, None),
        };

        let row = sqlx::query_as::<_, WithdrawalRow>(&format!(
            r#"
            INSERT INTO withdrawals (id, lot_number, quantity_removed, reference, timestamp,
                                     value_at_withdrawal, piece_name, piece_quantity,
                                     material, dimensions, supplier, shape)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {WITHDRAWAL_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(record.lot_number)
        .bind(record.quantity_removed)
        .bind(&record.reference)
        .bind(Utc::now())
        .bind(record.value_at_withdrawal)
        .bind(piece_name)
        .bind(piece_quantity)
        .bind(&record.material)
        .bind(&record.dimensions)
        .bind(&record.supplier)
        .bind(Json(&record.shape))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }
}

#[async_trait]
impl PurchaseRepository for PgStockRepository {
    async fn list_purchases(&self) -> RepoResult<Vec<PlannedPurchase>> {
        let rows = sqlx::query_as::<_, PurchaseRow>(&format!(
            "SELECT {PURCHASE_COLUMNS} FROM planned_purchases ORDER BY created_at DESC"
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(PlannedPurchase::try_from).collect()
    }

    async fn create_purchase(&self, draft: &LotDraft) -> RepoResult<PlannedPurchase> {
        let (shape_type, width, height, diameter) = shape_columns(&draft.shape);
        let row = sqlx::query_as::<_, PurchaseRow>(&format!(
            r#"
            INSERT INTO planned_purchases (id, shape_type, width, height, diameter, length,
                                           material, supplier, unit_price, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {PURCHASE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(shape_type)
        .bind(width)
        .bind(height)
        .bind(diameter)
        .bind(draft.original_length)
        .bind(&draft.material)
        .bind(&draft.supplier)
        .bind(draft.unit_price)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }

    async fn delete_purchase(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM planned_purchases WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn transfer_purchase(&self, id: Uuid) -> RepoResult<Option<Lot>> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, PurchaseRow>(&format!(
            "DELETE FROM planned_purchases WHERE id = $1 RETURNING {PURCHASE_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };
        let purchase = PlannedPurchase::try_from(row)?;
        let lot = Self::insert_lot(&mut tx, &purchase.to_draft()).await?;

        tx.commit().await?;
        Ok(Some(lot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_columns_round_trip() {
        let shapes = [
            Shape::Rectangular {
                width: Decimal::from(20),
                height: Decimal::from(30),
            },
            Shape::Circular {
                diameter: Decimal::from(12),
            },
        ];
        for shape in shapes {
            let (kind, w, h, d) = shape_columns(&shape);
            assert_eq!(shape_from_columns(kind, w, h, d).unwrap(), shape);
        }
    }

    #[test]
    fn test_shape_without_dimensions_is_rejected() {
        let result = shape_from_columns("circular", None, None, None);
        assert!(matches!(result, Err(RepositoryError::InvalidRow(_))));
        assert!(shape_from_columns("hexagonal", None, None, Some(Decimal::ONE)).is_err());
    }
}
