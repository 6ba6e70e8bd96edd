//! Planned purchase models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{LotDraft, Shape};

/// Stock the workshop intends to buy; becomes a lot once it is received
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlannedPurchase {
    pub id: Uuid,
    pub shape: Shape,
    pub length: Decimal,
    pub material: String,
    pub supplier: String,
    pub unit_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl PlannedPurchase {
    pub fn from_draft(id: Uuid, draft: &LotDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            shape: draft.shape.clone(),
            length: draft.original_length,
            material: draft.material.clone(),
            supplier: draft.supplier.clone(),
            unit_price: draft.unit_price,
            created_at,
        }
    }

    /// Lot contents this purchase turns into when transferred to stock
    pub fn to_draft(&self) -> LotDraft {
        LotDraft {
            shape: self.shape.clone(),
            original_length: self.length,
            material: self.material.clone(),
            supplier: self.supplier.clone(),
            unit_price: self.unit_price,
        }
    }
}
