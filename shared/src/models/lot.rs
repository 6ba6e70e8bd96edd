//! Lot models

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::StockError;

/// Cross-section of a bar, rod or sheet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Rectangular { width: Decimal, height: Decimal },
    Circular { diameter: Decimal },
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Rectangular { .. } => ShapeKind::Rectangular,
            Shape::Circular { .. } => ShapeKind::Circular,
        }
    }

    /// Label used to group material references: `20x30` or `⌀20`
    pub fn dimension_label(&self) -> String {
        match self {
            Shape::Rectangular { width, height } => {
                format!("{}x{}", width.normalize(), height.normalize())
            }
            Shape::Circular { diameter } => format!("⌀{}", diameter.normalize()),
        }
    }

    pub fn diameter(&self) -> Option<Decimal> {
        match self {
            Shape::Circular { diameter } => Some(*diameter),
            Shape::Rectangular { .. } => None,
        }
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} mm", self.dimension_label())
    }
}

/// Shape discriminant, as submitted by forms and stored in the lots table
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Rectangular,
    Circular,
}

impl ShapeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::Rectangular => "rectangular",
            ShapeKind::Circular => "circular",
        }
    }
}

impl FromStr for ShapeKind {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rectangular" => Ok(ShapeKind::Rectangular),
            "circular" => Ok(ShapeKind::Circular),
            other => Err(StockError::validation(
                "shape",
                format!("Unknown shape '{}'", other),
            )),
        }
    }
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShapeKind::Rectangular => write!(f, "Rectangular"),
            ShapeKind::Circular => write!(f, "Circular"),
        }
    }
}

/// A quantity of material cut from one purchased unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Lot {
    pub lot_number: i64,
    pub shape: Shape,
    /// Length in mm at purchase time, never changes
    pub original_length: Decimal,
    /// Always within `[0, original_length]`
    pub remaining_length: Decimal,
    pub material: String,
    pub supplier: String,
    /// Price paid for the full original length
    pub unit_price: Option<Decimal>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
}

impl Lot {
    /// Build a fresh, full, active lot from a validated draft
    pub fn from_draft(lot_number: i64, draft: &LotDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            lot_number,
            shape: draft.shape.clone(),
            original_length: draft.original_length,
            remaining_length: draft.original_length,
            material: draft.material.clone(),
            supplier: draft.supplier.clone(),
            unit_price: draft.unit_price,
            archived: false,
            created_at,
        }
    }

    pub fn dimension_label(&self) -> String {
        self.shape.dimension_label()
    }

    pub fn is_low_stock(&self, threshold: Decimal) -> bool {
        !self.archived && self.remaining_length <= threshold
    }

    pub fn is_depleted(&self) -> bool {
        self.remaining_length.is_zero()
    }
}

/// Raw "add stock" form input; validated into a [`LotDraft`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateLotInput {
    #[serde(rename = "type")]
    pub shape: Option<ShapeKind>,
    pub width: Option<Decimal>,
    pub height: Option<Decimal>,
    pub diameter: Option<Decimal>,
    pub length: Option<Decimal>,
    #[serde(default)]
    pub material: String,
    #[serde(default)]
    pub supplier: String,
    pub unit_price: Option<Decimal>,
}

/// Validated lot contents, before a lot number is assigned
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LotDraft {
    pub shape: Shape,
    pub original_length: Decimal,
    pub material: String,
    pub supplier: String,
    pub unit_price: Option<Decimal>,
}

/// Filter accepted by lot listings
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LotFilter {
    pub archived: Option<bool>,
}

impl LotFilter {
    pub fn active() -> Self {
        Self {
            archived: Some(false),
        }
    }

    pub fn archived() -> Self {
        Self {
            archived: Some(true),
        }
    }

    pub fn all() -> Self {
        Self { archived: None }
    }

    pub fn matches(&self, lot: &Lot) -> bool {
        self.archived.map_or(true, |a| lot.archived == a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_dimension_label_rectangular() {
        let shape = Shape::Rectangular {
            width: dec("20"),
            height: dec("30.0"),
        };
        assert_eq!(shape.dimension_label(), "20x30");
        assert_eq!(shape.to_string(), "20x30 mm");
    }

    #[test]
    fn test_dimension_label_circular() {
        let shape = Shape::Circular {
            diameter: dec("12.50"),
        };
        assert_eq!(shape.dimension_label(), "⌀12.5");
        assert_eq!(shape.diameter(), Some(dec("12.50")));
    }

    #[test]
    fn test_shape_serde_is_tagged() {
        let shape = Shape::Circular {
            diameter: dec("20"),
        };
        let json = serde_json::to_value(&shape).unwrap();
        assert_eq!(json["type"], "circular");

        let back: Shape =
            serde_json::from_str(r#"{"type":"rectangular","width":"20","height":"30"}"#).unwrap();
        assert_eq!(back.kind(), ShapeKind::Rectangular);
    }

    #[test]
    fn test_shape_kind_parses_stored_names() {
        for kind in [ShapeKind::Rectangular, ShapeKind::Circular] {
            assert_eq!(kind.as_str().parse::<ShapeKind>(), Ok(kind));
        }
        assert!(matches!(
            "hexagonal".parse::<ShapeKind>(),
            Err(StockError::Validation { ref field, .. }) if field == "shape"
        ));
    }

    #[test]
    fn test_lot_filter() {
        let draft = LotDraft {
            shape: Shape::Circular {
                diameter: dec("20"),
            },
            original_length: dec("1000"),
            material: "Steel".to_string(),
            supplier: "A".to_string(),
            unit_price: None,
        };
        let mut lot = Lot::from_draft(1, &draft, Utc::now());
        assert_eq!(lot.remaining_length, dec("1000"));
        assert!(LotFilter::active().matches(&lot));
        assert!(!LotFilter::archived().matches(&lot));

        lot.archived = true;
        assert!(LotFilter::archived().matches(&lot));
        assert!(LotFilter::all().matches(&lot));
    }
}
