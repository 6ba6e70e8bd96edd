//! Validation utilities for stock input
//!
//! Field-level checks return a static message; the `validate_*_input`
//! functions collect every failing field into one [`StockError::Validation`].

use rust_decimal::Decimal;

use crate::error::{StockError, StockResult};
use crate::models::{CreateLotInput, LotDraft, PieceInfo, Shape, ShapeKind};

// ============================================================================
// Field Validations
// ============================================================================

/// Validate a dimension or length is present and strictly positive
pub fn validate_positive_length(value: Option<Decimal>) -> Result<Decimal, &'static str> {
    match value {
        None => Err("Value is required"),
        Some(v) if v <= Decimal::ZERO => Err("Value must be greater than zero"),
        Some(v) => Ok(v),
    }
}

/// Validate a purchase price is not negative
pub fn validate_unit_price(price: Option<Decimal>) -> Result<(), &'static str> {
    match price {
        Some(p) if p < Decimal::ZERO => Err("Price cannot be negative"),
        _ => Ok(()),
    }
}

/// Validate a free-text identifier (material, supplier, reference)
pub fn validate_required_text(value: &str) -> Result<(), &'static str> {
    if value.trim().is_empty() {
        return Err("Value is required");
    }
    Ok(())
}

/// Validate the optional piece tag on a withdrawal
pub fn validate_piece_info(piece: &PieceInfo) -> Result<(), &'static str> {
    if piece.name.trim().is_empty() {
        return Err("Piece name is required");
    }
    if piece.quantity < 1 {
        return Err("Piece quantity must be at least 1");
    }
    Ok(())
}

// ============================================================================
// Input Validations
// ============================================================================

/// Validate "add stock" input and turn it into a typed draft.
///
/// Rectangular lots need `width` and `height`, circular lots need `diameter`.
/// Dimensions belonging to the other shape are ignored.
pub fn validate_lot_input(input: &CreateLotInput) -> StockResult<LotDraft> {
    let mut invalid: Vec<&'static str> = Vec::new();
    let mut messages: Vec<String> = Vec::new();

    let mut check = |field: &'static str, result: Result<(), &'static str>| {
        if let Err(msg) = result {
            invalid.push(field);
            messages.push(format!("{}: {}", field, msg));
        }
    };

    let shape = match input.shape {
        None => {
            check("type", Err("Shape type is required"));
            None
        }
        Some(ShapeKind::Rectangular) => {
            let width = validate_positive_length(input.width);
            let height = validate_positive_length(input.height);
            check("width", width.map(|_| ()));
            check("height", height.map(|_| ()));
            match (width, height) {
                (Ok(width), Ok(height)) => Some(Shape::Rectangular { width, height }),
                _ => None,
            }
        }
        Some(ShapeKind::Circular) => {
            let diameter = validate_positive_length(input.diameter);
            check("diameter", diameter.map(|_| ()));
            diameter.ok().map(|diameter| Shape::Circular { diameter })
        }
    };

    let length = validate_positive_length(input.length);
    check("length", length.map(|_| ()));
    check("material", validate_required_text(&input.material));
    check("supplier", validate_required_text(&input.supplier));
    check("unit_price", validate_unit_price(input.unit_price));

    match (shape, length) {
        (Some(shape), Ok(original_length)) if invalid.is_empty() => Ok(LotDraft {
            shape,
            original_length,
            material: input.material.trim().to_string(),
            supplier: input.supplier.trim().to_string(),
            unit_price: input.unit_price,
        }),
        _ => Err(StockError::Validation {
            field: invalid.join(","),
            message: messages.join("; "),
        }),
    }
}
