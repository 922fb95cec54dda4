use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount must be greater than zero")]
    NotPositive,
    #[error("amount is too large")]
    Overflow,
}

/// Total for `quantity` tickets, rounded to whole currency cents.
pub fn line_total(price: Decimal, quantity: i32) -> Decimal {
    (price * Decimal::from(quantity)).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts a major-unit amount to the integer minor units the gateway takes.
pub fn to_minor_units(amount: Decimal) -> Result<i64, AmountError> {
    if amount <= Decimal::ZERO {
        return Err(AmountError::NotPositive);
    }

    let minor = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or(AmountError::Overflow)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    match minor.to_i64() {
        Some(0) => Err(AmountError::NotPositive),
        Some(value) => Ok(value),
        None => Err(AmountError::Overflow),
    }
}
