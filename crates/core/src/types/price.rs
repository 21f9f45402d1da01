//! Decimal money arithmetic for cart and catalog prices.
//!
//! All amounts are `rust_decimal::Decimal` values in the store currency with
//! two decimal places. Rounding is half away from zero (`0.125 -> 0.13`),
//! never banker's rounding, and every rounded value is rescaled so it always
//! serializes with exactly two places (`"20.00"`, not `"20"`).

use rust_decimal::{Decimal, RoundingStrategy};

use super::quantity::Quantity;

/// Number of decimal places stored for every monetary amount.
pub const MONEY_SCALE: u32 = 2;

/// Exclusive upper bound of a NUMERIC(10,2) amount.
pub const MONEY_LIMIT: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

/// Errors raised when validating a price supplied by a client.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// The amount does not fit in NUMERIC(10,2).
    #[error("price must be less than {max}")]
    TooLarge {
        /// Exclusive upper bound.
        max: Decimal,
    },
}

/// Round an amount to two decimal places, half away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// Subtotal of one cart line: `unit_price * quantity`, rounded.
#[must_use]
pub fn line_subtotal(unit_price: Decimal, quantity: Quantity) -> Decimal {
    round_money(unit_price * Decimal::from(quantity.get()))
}

/// Cart total: the rounded sum of every line subtotal.
///
/// An empty cart totals `0.00`.
#[must_use]
pub fn cart_total<I>(subtotals: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    round_money(subtotals.into_iter().sum())
}

/// Validate and normalize a unit price for storage.
///
/// # Errors
///
/// Returns [`PriceError`] when the price is negative or exceeds the column
/// precision (eight integer digits).
pub fn normalize_price(price: Decimal) -> Result<Decimal, PriceError> {
    let max = MONEY_LIMIT;
    if price.is_sign_negative() && !price.is_zero() {
        return Err(PriceError::Negative);
    }
    let rounded = round_money(price);
    if rounded >= max {
        return Err(PriceError::TooLarge { max });
    }
    Ok(rounded)
}
