//! Stock ledger rules
//!
//! Pure functions deciding lot numbers, remaining lengths and withdrawal
//! values. Persistence layers call these and only commit what they return.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{StockError, StockResult};
use crate::models::{Lot, WithdrawInput, WithdrawalDraft, WithdrawalMode, WithdrawalPlan};
use crate::validation::{validate_piece_info, validate_required_text};

/// Next lot number: highest number among all lots, archived included, plus one
pub fn next_lot_number<'a>(lots: impl IntoIterator<Item = &'a Lot>) -> i64 {
    lots.into_iter()
        .map(|l| l.lot_number)
        .max()
        .map_or(1, |max| max + 1)
}

/// Round a monetary amount to cents, always carrying two decimal places
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Convert a submitted amount into the lot's new remaining length.
///
/// The result must stay within `[0, original_length]`, must not exceed what
/// the lot currently holds, and must remove something.
pub fn resolve_remaining(lot: &Lot, mode: WithdrawalMode, amount: Decimal) -> StockResult<Decimal> {
    if amount < Decimal::ZERO {
        return Err(StockError::InvalidQuantity(format!(
            "Amount {} cannot be negative",
            amount
        )));
    }

    let new_remaining = match mode {
        WithdrawalMode::SetRemaining => amount,
        WithdrawalMode::RemoveAmount => lot.remaining_length - amount,
    };

    if new_remaining < Decimal::ZERO {
        return Err(StockError::InvalidQuantity(format!(
            "Lot {} has only {} mm left, cannot remove {} mm",
            lot.lot_number, lot.remaining_length, amount
        )));
    }
    if new_remaining > lot.original_length {
        return Err(StockError::InvalidQuantity(format!(
            "Remaining length {} mm exceeds the original length {} mm of lot {}",
            new_remaining, lot.original_length, lot.lot_number
        )));
    }
    if new_remaining > lot.remaining_length {
        return Err(StockError::InvalidQuantity(format!(
            "Remaining length {} mm exceeds the {} mm available on lot {}",
            new_remaining, lot.remaining_length, lot.lot_number
        )));
    }
    if new_remaining == lot.remaining_length {
        return Err(StockError::InvalidQuantity(
            "A withdrawal must remove a positive length".to_string(),
        ));
    }

    Ok(new_remaining)
}

/// Value of `quantity_removed` as a share of the price paid for the whole lot.
///
/// Fails with `InvalidQuantity` when the value does not fit a `Decimal`.
pub fn withdrawal_value(
    unit_price: Option<Decimal>,
    quantity_removed: Decimal,
    original_length: Decimal,
) -> StockResult<Decimal> {
    match unit_price {
        Some(price) if !original_length.is_zero() => price
            .checked_mul(quantity_removed)
            .and_then(|v| v.checked_div(original_length))
            .map(round_money)
            .ok_or_else(|| {
                StockError::InvalidQuantity(format!(
                    "Value of {} mm at price {} is too large to record",
                    quantity_removed, price
                ))
            }),
        _ => Ok(Decimal::ZERO),
    }
}

/// Validate a withdrawal against the lot's current state and build the record
pub fn plan_withdrawal(lot: &Lot, input: &WithdrawInput) -> StockResult<WithdrawalPlan> {
    if lot.archived {
        return Err(StockError::NotFound {
            lot_number: lot.lot_number,
        });
    }

    validate_required_text(&input.reference)
        .map_err(|msg| StockError::validation("reference", msg))?;
    if let Some(piece) = &input.piece_info {
        validate_piece_info(piece).map_err(|msg| StockError::validation("piece_info", msg))?;
    }

    let new_remaining = resolve_remaining(lot, input.mode, input.amount)?;
    let quantity_removed = lot.remaining_length - new_remaining;
    let value_at_withdrawal = withdrawal_value(lot.unit_price, quantity_removed, lot.original_length)?;

    Ok(WithdrawalPlan {
        expected_remaining: lot.remaining_length,
        new_remaining,
        record: WithdrawalDraft {
            lot_number: lot.lot_number,
            quantity_removed,
            reference: input.reference.trim().to_string(),
            value_at_withdrawal,
            piece_info: input.piece_info.clone(),
            material: lot.material.clone(),
            dimensions: lot.dimension_label(),
            supplier: lot.supplier.clone(),
            shape: lot.shape.clone(),
        },
    })
}

/// Archival is expected once a lot is used up, though it is not enforced
pub fn archive_expected(lot: &Lot) -> bool {
    lot.is_depleted()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PieceInfo, Shape};
    use chrono::Utc;

    fn lot(lot_number: i64, remaining: i64) -> Lot {
        Lot {
            lot_number,
            shape: Shape::Rectangular {
                width: Decimal::from(20),
                height: Decimal::from(30),
            },
            original_length: Decimal::from(1000),
            remaining_length: Decimal::from(remaining),
            material: "Steel".to_string(),
            supplier: "A".to_string(),
            unit_price: Some(Decimal::from(100)),
            archived: false,
            created_at: Utc::now(),
        }
    }

    fn input(mode: WithdrawalMode, amount: i64) -> WithdrawInput {
        WithdrawInput {
            mode,
            amount: Decimal::from(amount),
            reference: "REF1".to_string(),
            piece_info: None,
        }
    }

    #[test]
    fn test_next_lot_number_empty() {
        let lots: Vec<Lot> = vec![];
        assert_eq!(next_lot_number(&lots), 1);
    }

    #[test]
    fn test_next_lot_number_counts_archived() {
        let mut archived = lot(7, 0);
        archived.archived = true;
        let lots = vec![lot(2, 10), archived, lot(5, 10)];
        assert_eq!(next_lot_number(&lots), 8);
    }

    #[test]
    fn test_remove_amount() {
        let l = lot(1, 1000);
        let remaining = resolve_remaining(&l, WithdrawalMode::RemoveAmount, Decimal::from(300));
        assert_eq!(remaining, Ok(Decimal::from(700)));
    }

    #[test]
    fn test_remove_everything_leaves_zero() {
        let l = lot(1, 640);
        let remaining = resolve_remaining(&l, WithdrawalMode::RemoveAmount, Decimal::from(640));
        assert_eq!(remaining, Ok(Decimal::ZERO));
    }

    #[test]
    fn test_remove_too_much_is_rejected() {
        let l = lot(1, 100);
        let result = resolve_remaining(&l, WithdrawalMode::RemoveAmount, Decimal::from(101));
        assert!(matches!(result, Err(StockError::InvalidQuantity(_))));
    }

    #[test]
    fn test_set_remaining_above_original_is_rejected() {
        let l = lot(1, 1000);
        let result = resolve_remaining(&l, WithdrawalMode::SetRemaining, Decimal::from(1200));
        assert!(matches!(result, Err(StockError::InvalidQuantity(_))));
    }

    #[test]
    fn test_set_remaining_above_current_is_rejected() {
        let l = lot(1, 500);
        let result = resolve_remaining(&l, WithdrawalMode::SetRemaining, Decimal::from(800));
        assert!(matches!(result, Err(StockError::InvalidQuantity(_))));
    }

    #[test]
    fn test_zero_removal_is_rejected() {
        let l = lot(1, 500);
        assert!(resolve_remaining(&l, WithdrawalMode::RemoveAmount, Decimal::ZERO).is_err());
        assert!(resolve_remaining(&l, WithdrawalMode::SetRemaining, Decimal::from(500)).is_err());
    }

    #[test]
    fn test_negative_amount_is_rejected() {
        let l = lot(1, 500);
        let result = resolve_remaining(&l, WithdrawalMode::RemoveAmount, Decimal::from(-10));
        assert!(matches!(result, Err(StockError::InvalidQuantity(_))));
    }

    #[test]
    fn test_withdrawal_value() {
        let value =
            withdrawal_value(Some(Decimal::from(100)), Decimal::from(300), Decimal::from(1000)).unwrap();
        assert_eq!(value, Decimal::new(3000, 2));
        assert_eq!(value.to_string(), "30.00");
    }

    #[test]
    fn test_withdrawal_value_without_price() {
        let value = withdrawal_value(None, Decimal::from(300), Decimal::from(1000)).unwrap();
        assert_eq!(value, Decimal::ZERO);
    }

    #[test]
    fn test_withdrawal_value_rounds_to_cents() {
        // 10 * 1 / 3 = 3.333...
        let value = withdrawal_value(Some(Decimal::from(10)), Decimal::from(1), Decimal::from(3)).unwrap();
        assert_eq!(value, Decimal::new(333, 2));
    }

    #[test]
    fn test_withdrawal_value_overflow_is_rejected() {
        let value = withdrawal_value(Some(Decimal::MAX), Decimal::from(300), Decimal::from(1000));
        assert!(matches!(value, Err(StockError::InvalidQuantity(_))));
    }

    #[test]
    fn test_plan_withdrawal_snapshots_lot() {
        let l = lot(1, 1000);
        let plan = plan_withdrawal(&l, &input(WithdrawalMode::RemoveAmount, 300)).unwrap();

        assert_eq!(plan.expected_remaining, Decimal::from(1000));
        assert_eq!(plan.new_remaining, Decimal::from(700));
        assert_eq!(plan.record.quantity_removed, Decimal::from(300));
        assert_eq!(plan.record.value_at_withdrawal, Decimal::new(3000, 2));
        assert_eq!(plan.record.dimensions, "20x30");
        assert_eq!(plan.record.material, "Steel");
        assert_eq!(plan.record.supplier, "A");
    }

    #[test]
    fn test_plan_withdrawal_requires_reference() {
        let l = lot(1, 1000);
        let mut req = input(WithdrawalMode::RemoveAmount, 300);
        req.reference = "   ".to_string();
        match plan_withdrawal(&l, &req) {
            Err(StockError::Validation { field, .. }) => assert_eq!(field, "reference"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_plan_withdrawal_checks_piece_info() {
        let l = lot(1, 1000);
        let mut req = input(WithdrawalMode::RemoveAmount, 300);
        req.piece_info = Some(PieceInfo {
            name: "Spacer".to_string(),
            quantity: 0,
        });
        assert!(matches!(
            plan_withdrawal(&l, &req),
            Err(StockError::Validation { .. })
        ));
    }

    #[test]
    fn test_plan_withdrawal_on_archived_lot_is_not_found() {
        let mut l = lot(3, 1000);
        l.archived = true;
        assert_eq!(
            plan_withdrawal(&l, &input(WithdrawalMode::RemoveAmount, 1)),
            Err(StockError::NotFound { lot_number: 3 })
        );
    }

    #[test]
    fn test_archive_expected() {
        assert!(archive_expected(&lot(1, 0)));
        assert!(!archive_expected(&lot(1, 1)));
    }
}
