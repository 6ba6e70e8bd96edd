//! WebAssembly module for the bar stock ledger
//!
//! Provides client-side previews of the arithmetic the server enforces:
//! - Dimension labels
//! - Remaining length after a withdrawal
//! - Withdrawal value
//! - Price quotes
//!
//! Decimals cross the boundary as strings so no precision is lost to `f64`.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;

use shared::ledger::{resolve_remaining, withdrawal_value};
use shared::reporting::price_quote;
use shared::validation::validate_lot_input;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages in browser console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// What a withdrawal would do to a lot
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct WithdrawalPreview {
    pub new_remaining: Decimal,
    pub quantity_removed: Decimal,
    pub value_at_withdrawal: Decimal,
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal, String> {
    Decimal::from_str(value.trim()).map_err(|e| format!("Invalid {}: {}", field, e))
}

fn parse_mode(mode: &str) -> Result<WithdrawalMode, String> {
    match mode {
        "set_remaining" => Ok(WithdrawalMode::SetRemaining),
        "remove_amount" => Ok(WithdrawalMode::RemoveAmount),
        other => Err(format!("Unknown withdrawal mode: {}", other)),
    }
}

fn preview(lot: &Lot, mode: &str, amount: &str) -> Result<WithdrawalPreview, String> {
    let mode = parse_mode(mode)?;
    let amount = parse_decimal("amount", amount)?;
    let new_remaining = resolve_remaining(lot, mode, amount).map_err(|e| e.to_string())?;
    let quantity_removed = lot.remaining_length - new_remaining;
    let value_at_withdrawal = withdrawal_value(lot.unit_price, quantity_removed, lot.original_length)
        .map_err(|e| e.to_string())?;

    Ok(WithdrawalPreview {
        new_remaining,
        quantity_removed,
        value_at_withdrawal,
    })
}

fn quote(lot: &Lot, desired_length: &str, margin: &str) -> Result<Option<PriceQuote>, String> {
    let desired_length = if desired_length.trim().is_empty() {
        None
    } else {
        Some(parse_decimal("length", desired_length)?)
    };
    let margin = parse_decimal("margin", margin)?;
    price_quote(lot, desired_length, margin).map_err(|e| e.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn parse_lot(lot_json: &str) -> Result<Lot, JsValue> {
    serde_json::from_str(lot_json).map_err(|e| JsValue::from_str(&format!("Invalid lot JSON: {}", e)))
}

/// Dimension label of a shape: `20x30` or `⌀20`
#[wasm_bindgen]
pub fn dimension_label(shape_json: &str) -> Result<String, JsValue> {
    let shape: Shape = serde_json::from_str(shape_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid shape JSON: {}", e)))?;
    Ok(shape.dimension_label())
}

/// Preview a withdrawal; returns `WithdrawalPreview` as JSON
#[wasm_bindgen]
pub fn preview_withdrawal(lot_json: &str, mode: &str, amount: &str) -> Result<String, JsValue> {
    let lot = parse_lot(lot_json)?;
    let preview = preview(&lot, mode, amount).map_err(|e| JsValue::from_str(&e))?;
    to_json(&preview)
}

/// Value of a removed length; an empty price means the lot was not priced
#[wasm_bindgen]
pub fn calculate_withdrawal_value(
    unit_price: &str,
    quantity_removed: &str,
    original_length: &str,
) -> Result<String, JsValue> {
    let unit_price = if unit_price.trim().is_empty() {
        None
    } else {
        Some(parse_decimal("unit price", unit_price).map_err(|e| JsValue::from_str(&e))?)
    };
    let quantity = parse_decimal("quantity", quantity_removed).map_err(|e| JsValue::from_str(&e))?;
    let original = parse_decimal("original length", original_length).map_err(|e| JsValue::from_str(&e))?;
    withdrawal_value(unit_price, quantity, original)
        .map(|value| value.to_string())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Price quote as JSON, or `null` without a price or a length
#[wasm_bindgen]
pub fn calculate_price_quote(lot_json: &str, desired_length: &str, margin: &str) -> Result<String, JsValue> {
    let lot = parse_lot(lot_json)?;
    let quote = quote(&lot, desired_length, margin).map_err(|e| JsValue::from_str(&e))?;
    to_json(&quote)
}

/// Check an "add stock" form; returns the invalid fields, comma separated, or an empty string
#[wasm_bindgen]
pub fn validate_lot_form(input_json: &str) -> Result<String, JsValue> {
    let input: CreateLotInput = serde_json::from_str(input_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid form JSON: {}", e)))?;
    Ok(match validate_lot_input(&input) {
        Ok(_) => String::new(),
        Err(shared::StockError::Validation { field, .. }) => field,
        Err(other) => other.to_string(),
    })
}
