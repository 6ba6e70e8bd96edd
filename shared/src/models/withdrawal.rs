//! Withdrawal models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Shape;

/// How the submitted amount is interpreted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalMode {
    /// The amount is the length left on the lot after the cut
    SetRemaining,
    /// The amount is the length taken off the lot
    RemoveAmount,
}

/// Optional tag naming what the material was cut for
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PieceInfo {
    pub name: String,
    pub quantity: i32,
}

/// An immutable record of material removed from a lot.
///
/// Material, dimensions, supplier and shape are copied from the lot so the
/// history stays accurate after the lot is archived or repriced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Withdrawal {
    pub id: Uuid,
    pub lot_number: i64,
    pub quantity_removed: Decimal,
    pub reference: String,
    pub timestamp: DateTime<Utc>,
    pub value_at_withdrawal: Decimal,
    pub piece_info: Option<PieceInfo>,
    pub material: String,
    pub dimensions: String,
    pub supplier: String,
    pub shape: Shape,
}

impl Withdrawal {
    /// Stamp a draft with its identity and write time
    pub fn from_draft(id: Uuid, draft: &WithdrawalDraft, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            lot_number: draft.lot_number,
            quantity_removed: draft.quantity_removed,
            reference: draft.reference.clone(),
            timestamp,
            value_at_withdrawal: draft.value_at_withdrawal,
            piece_info: draft.piece_info.clone(),
            material: draft.material.clone(),
            dimensions: draft.dimensions.clone(),
            supplier: draft.supplier.clone(),
            shape: draft.shape.clone(),
        }
    }
}

/// Withdrawal contents computed by the ledger, before the store stamps it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WithdrawalDraft {
    pub lot_number: i64,
    pub quantity_removed: Decimal,
    pub reference: String,
    pub value_at_withdrawal: Decimal,
    pub piece_info: Option<PieceInfo>,
    pub material: String,
    pub dimensions: String,
    pub supplier: String,
    pub shape: Shape,
}

/// Request body of a withdrawal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawInput {
    pub mode: WithdrawalMode,
    pub amount: Decimal,
    #[serde(default)]
    pub reference: String,
    pub piece_info: Option<PieceInfo>,
}

/// A validated withdrawal: the record to append and the lot transition it implies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalPlan {
    /// Remaining length the lot must still have when the write lands
    pub expected_remaining: Decimal,
    pub new_remaining: Decimal,
    pub record: WithdrawalDraft,
}

/// Filter accepted by withdrawal listings
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WithdrawalFilter {
    pub lot_number: Option<i64>,
}

impl WithdrawalFilter {
    pub fn matches(&self, withdrawal: &Withdrawal) -> bool {
        self.lot_number.map_or(true, |n| withdrawal.lot_number == n)
    }
}
