//! Reporting derivations over lots and withdrawals
//!
//! Nothing here is persisted; every report is recomputed from the current
//! collections.

use std::cmp::Ordering;
use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::error::{StockError, StockResult};
use crate::ledger::round_money;
use crate::models::{ArchivedLotHistory, Lot, MaterialReference, PriceQuote, Withdrawal};
use crate::types::{LotSearch, ReferenceSort, SortDirection};

/// Default low-stock threshold in mm
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 200;

/// Default resale margin applied to price quotes (30%)
pub fn default_price_margin() -> Decimal {
    Decimal::new(13, 1)
}

/// Active lots at or below `threshold`, by ascending lot number
pub fn low_stock(lots: &[Lot], threshold: Decimal) -> Vec<Lot> {
    let mut low: Vec<Lot> = lots
        .iter()
        .filter(|l| l.is_low_stock(threshold))
        .cloned()
        .collect();
    low.sort_by_key(|l| l.lot_number);
    low
}

/// Bring labels written by older clients (`"20x30 mm"`, `"Ø20"`) to the current form
pub fn normalize_dimension_label(label: &str) -> String {
    let trimmed = label.trim();
    let trimmed = trimmed.strip_suffix("mm").map(str::trim_end).unwrap_or(trimmed);
    trimmed.replace('Ø', "⌀")
}

/// Group lots by dimension label and material.
///
/// Consumption is joined on the withdrawal's snapshot label and material, not
/// on lot identity, so unrelated lots sharing a label add up together.
/// Groups come out in the order their first lot appears.
pub fn material_references(lots: &[Lot], withdrawals: &[Withdrawal]) -> Vec<MaterialReference> {
    let mut references: Vec<MaterialReference> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for lot in lots {
        let key = (lot.dimension_label(), lot.material.clone());
        match index.get(&key) {
            Some(&i) => {
                let reference = &mut references[i];
                if !reference.suppliers.contains(&lot.supplier) {
                    reference.suppliers.push(lot.supplier.clone());
                }
            }
            None => {
                index.insert(key.clone(), references.len());
                references.push(MaterialReference {
                    dimensions: key.0,
                    material: key.1,
                    suppliers: vec![lot.supplier.clone()],
                    total_consumed: Decimal::ZERO,
                });
            }
        }
    }

    for withdrawal in withdrawals {
        let key = (
            normalize_dimension_label(&withdrawal.dimensions),
            withdrawal.material.clone(),
        );
        if let Some(&i) = index.get(&key) {
            references[i].total_consumed =
                references[i].total_consumed.saturating_add(withdrawal.quantity_removed);
        }
    }

    references
}

/// Stable sort by the chosen column; ties fall back to the other natural key
/// in ascending lexical order.
pub fn sort_references(
    references: &mut [MaterialReference],
    sort: ReferenceSort,
    direction: SortDirection,
) {
    references.sort_by(|a, b| {
        let by_dimensions = a.dimensions.cmp(&b.dimensions);
        let by_material = a.material.cmp(&b.material);
        match sort {
            ReferenceSort::Dimensions => direction.apply(by_dimensions).then(by_material),
            ReferenceSort::Material => direction.apply(by_material).then(by_dimensions),
            ReferenceSort::TotalConsumed => direction
                .apply(a.total_consumed.cmp(&b.total_consumed))
                .then(by_dimensions)
                .then(by_material),
        }
    });
}

/// Keep references whose label, material or any supplier contains `term`
pub fn filter_references(references: Vec<MaterialReference>, term: &str) -> Vec<MaterialReference> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return references;
    }
    references
        .into_iter()
        .filter(|r| {
            r.dimensions.to_lowercase().contains(&term)
                || r.material.to_lowercase().contains(&term)
                || r.suppliers.iter().any(|s| s.to_lowercase().contains(&term))
        })
        .collect()
}

/// Active circular lots whose diameter matches exactly
pub fn price_candidates(lots: &[Lot], diameter: Decimal) -> Vec<Lot> {
    lots.iter()
        .filter(|l| !l.archived && l.shape.diameter() == Some(diameter))
        .cloned()
        .collect()
}

/// Resale estimate for `desired_length` of `lot`.
///
/// `None` when the lot has no price or no length was entered. A length whose
/// price does not fit a `Decimal` is a validation error on `length`.
pub fn price_quote(
    lot: &Lot,
    desired_length: Option<Decimal>,
    margin: Decimal,
) -> StockResult<Option<PriceQuote>> {
    let (Some(desired_length), Some(unit_price)) = (desired_length, lot.unit_price) else {
        return Ok(None);
    };
    if lot.original_length.is_zero() {
        return Ok(None);
    }

    let too_large = || StockError::validation("length", "Length is too large to quote");
    let base = unit_price
        .checked_div(lot.original_length)
        .and_then(|per_mm| per_mm.checked_mul(desired_length))
        .ok_or_else(too_large)?;
    let quoted = base.checked_mul(margin).ok_or_else(too_large)?;

    Ok(Some(PriceQuote {
        lot_number: lot.lot_number,
        desired_length,
        base_price: round_money(base),
        quoted_price: round_money(quoted),
    }))
}

/// Case-insensitive search over `lots`, ascending lot number
pub fn search_lots(lots: &[Lot], search: &LotSearch) -> Vec<Lot> {
    let needle = |s: &Option<String>| {
        s.as_deref()
            .map(|v| v.trim().to_lowercase())
            .filter(|v| !v.is_empty())
    };
    let dimensions = needle(&search.dimensions);
    let material = needle(&search.material);
    let supplier = needle(&search.supplier);

    let mut found: Vec<Lot> = lots
        .iter()
        .filter(|l| {
            dimensions.as_ref().map_or(true, |d| {
                let haystack = match l.shape.diameter() {
                    Some(diameter) => diameter.normalize().to_string(),
                    None => l.dimension_label(),
                };
                haystack.to_lowercase().contains(d.as_str())
            })
        })
        .filter(|l| {
            material
                .as_ref()
                .map_or(true, |m| l.material.to_lowercase().contains(m.as_str()))
        })
        .filter(|l| {
            supplier
                .as_ref()
                .map_or(true, |s| l.supplier.to_lowercase().contains(s.as_str()))
        })
        .cloned()
        .collect();
    found.sort_by_key(|l| l.lot_number);
    found
}

/// Archived lots by ascending number, each with its withdrawals newest first
pub fn archive_history(lots: &[Lot], withdrawals: &[Withdrawal]) -> Vec<ArchivedLotHistory> {
    let mut archived: Vec<&Lot> = lots.iter().filter(|l| l.archived).collect();
    archived.sort_by_key(|l| l.lot_number);

    archived
        .into_iter()
        .map(|lot| {
            let mut taken: Vec<Withdrawal> = withdrawals
                .iter()
                .filter(|w| w.lot_number == lot.lot_number)
                .cloned()
                .collect();
            taken.sort_by(|a, b| newest_first(a, b));
            ArchivedLotHistory {
                lot: lot.clone(),
                withdrawals: taken,
            }
        })
        .collect()
}

/// Ordering used by every withdrawal listing
pub fn newest_first(a: &Withdrawal, b: &Withdrawal) -> Ordering {
    b.timestamp.cmp(&a.timestamp)
}
