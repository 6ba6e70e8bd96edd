//! Report models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Lot, Withdrawal};

/// Consumption of one dimension + material pair across all lots
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MaterialReference {
    pub dimensions: String,
    pub material: String,
    /// Distinct suppliers in the order they were first seen
    pub suppliers: Vec<String>,
    pub total_consumed: Decimal,
}

/// Resale estimate for a length cut from a circular lot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceQuote {
    pub lot_number: i64,
    pub desired_length: Decimal,
    pub base_price: Decimal,
    pub quoted_price: Decimal,
}

/// An archived lot with the withdrawals taken from it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArchivedLotHistory {
    pub lot: Lot,
    pub withdrawals: Vec<Withdrawal>,
}
