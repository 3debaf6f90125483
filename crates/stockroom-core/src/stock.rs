//! # Stock Rules
//!
//! Pure arithmetic behind every stock mutation. The database layer runs these
//! inside its unit of work; nothing here touches storage.
//!
//! ## Lifecycle of an item's stock
//! ```text
//!   create "in"  q ──► stock + q
//!   create "out" q ──► stock ≥ q ? stock - q : InsufficientStock
//!   delete "in"  q ──► max(stock - q, 0)   (warning when clamped)
//!   delete "out" q ──► stock + q
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::TransactionKind;
use crate::CLAMPED_STOCK_WARNING;

/// True when `stock` is strictly below `minimum_stock`.
#[inline]
pub fn is_low_stock(stock: i64, minimum_stock: i64) -> bool {
    stock < minimum_stock
}

/// Fails with `InsufficientStock` when `quantity` exceeds `current_stock`.
pub fn check_outflow(current_stock: i64, quantity: i64) -> CoreResult<()> {
    if current_stock < quantity {
        return Err(CoreError::InsufficientStock {
            current_stock,
            required: quantity,
        });
    }
    Ok(())
}

/// Stock after recording a new transaction.
///
/// ## Returns
/// The new stock level, `InsufficientStock` for an out larger than stock,
/// or `ValidationFailed` on `quantity` when the result would not fit in `i64`.
pub fn apply_transaction(
    current_stock: i64,
    kind: TransactionKind,
    quantity: i64,
) -> CoreResult<i64> {
    if kind == TransactionKind::Out {
        check_outflow(current_stock, quantity)?;
    }
    current_stock.checked_add(kind.delta(quantity)).ok_or_else(|| {
        CoreError::invalid_field(ValidationError::TooLarge {
            field: "quantity".to_string(),
            max: i64::MAX - current_stock,
        })
    })
}

/// Outcome of undoing a transaction's effect on stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reversal {
    pub original_stock: i64,
    pub resulting_stock: i64,
    /// The unclamped result was negative and stock was pinned to zero.
    pub clamped: bool,
}

impl Reversal {
    /// Warning text to surface to the caller, if any.
    pub fn warning(&self) -> Option<String> {
        self.clamped.then(|| CLAMPED_STOCK_WARNING.to_string())
    }
}

/// Stock after deleting a transaction of `kind` and `quantity`.
///
/// Deleting an "in" subtracts, clamping at zero. Deleting an "out" adds.
pub fn reverse_delta(current_stock: i64, kind: TransactionKind, quantity: i64) -> Reversal {
    let unclamped = current_stock.saturating_sub(kind.delta(quantity));
    Reversal {
        original_stock: current_stock,
        resulting_stock: unclamped.max(0),
        clamped: unclamped < 0,
    }
}

/// Stock implied by a sequence of movements replayed from zero, never below zero.
pub fn ledger_stock<'a>(movements: impl IntoIterator<Item = &'a (TransactionKind, i64)>) -> i64 {
    movements
        .into_iter()
        .fold(0, |stock: i64, (kind, qty)| stock.saturating_add(kind.delta(*qty)).max(0))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_low_stock() {
        assert!(is_low_stock(2, 5));
        assert!(!is_low_stock(5, 5));
        assert!(!is_low_stock(0, 0));
    }

    #[test]
    fn test_check_outflow() {
        assert!(check_outflow(10, 10).is_ok());
        match check_outflow(5, 8) {
            Err(CoreError::InsufficientStock {
                current_stock,
                required,
            }) => {
                assert_eq!(current_stock, 5);
                assert_eq!(required, 8);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_apply_transaction() {
        assert_eq!(apply_transaction(0, TransactionKind::In, 10).unwrap(), 10);
        assert_eq!(apply_transaction(10, TransactionKind::Out, 8).unwrap(), 2);
        assert!(apply_transaction(2, TransactionKind::Out, 3).is_err());
    }

    #[test]
    fn test_apply_transaction_rejects_overflow() {
        assert_eq!(
            apply_transaction(0, TransactionKind::In, i64::MAX).unwrap(),
            i64::MAX
        );

        match apply_transaction(1, TransactionKind::In, i64::MAX) {
            Err(CoreError::ValidationFailed(errors)) => {
                assert_eq!(
                    errors.get("quantity"),
                    Some("quantity must be at most 9223372036854775806")
                );
            }
            other => panic!("unexpected: {other:?}"),
        }

        // an out never grows stock, so it cannot overflow
        assert_eq!(
            apply_transaction(i64::MAX, TransactionKind::Out, i64::MAX).unwrap(),
            0
        );
    }

    #[test]
    fn test_reverse_in_clamps_with_warning() {
        // worked example: in 10, out 8, then the "in" is deleted
        let reversal = reverse_delta(2, TransactionKind::In, 10);
        assert_eq!(reversal.original_stock, 2);
        assert_eq!(reversal.resulting_stock, 0);
        assert!(reversal.clamped);
        assert_eq!(reversal.warning().as_deref(), Some(CLAMPED_STOCK_WARNING));
    }

    #[test]
    fn test_reverse_without_clamp() {
        let reversal = reverse_delta(10, TransactionKind::In, 10);
        assert_eq!(reversal.resulting_stock, 0);
        assert!(!reversal.clamped);
        assert!(reversal.warning().is_none());

        let reversal = reverse_delta(2, TransactionKind::Out, 8);
        assert_eq!(reversal.resulting_stock, 10);
        assert!(!reversal.clamped);
    }

    #[test]
    fn test_ledger_stock() {
        let moves = [
            (TransactionKind::In, 10),
            (TransactionKind::Out, 4),
            (TransactionKind::In, 3),
        ];
        assert_eq!(ledger_stock(&moves), 9);
        assert_eq!(ledger_stock(&[]), 0);
        assert_eq!(
            ledger_stock(&[(TransactionKind::In, i64::MAX), (TransactionKind::In, 1)]),
            i64::MAX
        );
    }
}
