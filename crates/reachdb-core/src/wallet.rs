//! Withdrawal validation rules.
//!
//! These checks run synchronously before any database mutation is issued;
//! a failed check never reaches the store.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WithdrawalError {
    #[error("withdrawal amount is not a valid number")]
    InvalidAmount,
    #[error("withdrawal amount must be greater than zero")]
    NonPositiveAmount,
    #[error("withdrawal amount exceeds available balance")]
    InsufficientBalance,
}

/// Parse a user-entered withdrawal amount.
///
/// # Errors
///
/// Returns [`WithdrawalError::InvalidAmount`] for non-numeric input.
pub fn parse_withdrawal_amount(raw: &str) -> Result<Decimal, WithdrawalError> {
    Decimal::from_str_exact(raw.trim()).map_err(|_| WithdrawalError::InvalidAmount)
}

/// Validate a withdrawal request against the available balance.
///
/// # Errors
///
/// Returns [`WithdrawalError::NonPositiveAmount`] for zero or negative amounts,
/// [`WithdrawalError::InsufficientBalance`] when the amount exceeds `available`.
pub fn validate_withdrawal(amount: Decimal, available: Decimal) -> Result<(), WithdrawalError> {
    if amount <= Decimal::ZERO {
        return Err(WithdrawalError::NonPositiveAmount);
    }
    if amount > available {
        return Err(WithdrawalError::InsufficientBalance);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    #[test]
    fn rejects_non_numeric_input() {
        assert_eq!(
            parse_withdrawal_amount("ten dollars"),
            Err(WithdrawalError::InvalidAmount)
        );
        assert_eq!(parse_withdrawal_amount(""), Err(WithdrawalError::InvalidAmount));
    }

    #[test]
    fn accepts_numeric_input_with_whitespace() {
        assert_eq!(parse_withdrawal_amount(" 125.50 "), Ok(dec("125.50")));
    }

    #[test]
    fn rejects_zero_and_negative_amounts() {
        assert_eq!(
            validate_withdrawal(Decimal::ZERO, dec("100")),
            Err(WithdrawalError::NonPositiveAmount)
        );
        assert_eq!(
            validate_withdrawal(dec("-5"), dec("100")),
            Err(WithdrawalError::NonPositiveAmount)
        );
    }

    #[test]
    fn rejects_amounts_above_balance() {
        assert_eq!(
            validate_withdrawal(dec("100.01"), dec("100")),
            Err(WithdrawalError::InsufficientBalance)
        );
    }

    #[test]
    fn accepts_amount_equal_to_balance() {
        assert_eq!(validate_withdrawal(dec("100"), dec("100")), Ok(()));
    }
}
