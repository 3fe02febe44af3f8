//! Currency arithmetic.
//!
//! Amounts are [`Decimal`] values carried at exactly two fraction digits,
//! matching the `NUMERIC(12,2)` columns in the store. No floating point is
//! involved anywhere between the request body and the database.

use crate::error::{PharmacyError, Result};
use rust_decimal::Decimal;

/// Number of fraction digits for every stored amount.
pub const CURRENCY_SCALE: u32 = 2;

/// Largest amount a `NUMERIC(12,2)` column holds: 9 999 999 999.99.
///
/// ```
/// # use pharmacy_core::money::MAX_AMOUNT;
/// assert_eq!(MAX_AMOUNT.to_string(), "9999999999.99");
/// ```
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, CURRENCY_SCALE);

/// Normalize an amount to exactly [`CURRENCY_SCALE`] fraction digits.
///
/// Rounds half away from zero, so callers should only pass values that are
/// already exact to the cent (sums and products of validated prices are).
///
/// # Examples
///
/// ```
/// # use pharmacy_core::money::to_currency;
/// # use rust_decimal::Decimal;
/// assert_eq!(to_currency(Decimal::ZERO).to_string(), "0.00");
/// assert_eq!(to_currency(Decimal::new(45, 1)).to_string(), "4.50");
/// ```
#[must_use]
pub fn to_currency(amount: Decimal) -> Decimal {
    let mut amount = amount.round_dp(CURRENCY_SCALE);
    amount.rescale(CURRENCY_SCALE);
    amount
}

/// Validate a unit price.
///
/// # Errors
///
/// Returns [`PharmacyError::InvalidInput`] if the price is negative, has
/// more than two significant fraction digits, or exceeds [`MAX_AMOUNT`].
pub fn validate_price(price: Decimal) -> Result<Decimal> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(PharmacyError::invalid("Price must not be negative"));
    }
    if price.normalize().scale() > CURRENCY_SCALE {
        return Err(PharmacyError::invalid(
            "Price must have at most two fraction digits",
        ));
    }
    ensure_storable("Price", to_currency(price))
}

/// Reject an amount the store cannot hold.
///
/// # Errors
///
/// Returns [`PharmacyError::InvalidInput`] naming `what` if `amount` is
/// above [`MAX_AMOUNT`].
pub fn ensure_storable(what: &str, amount: Decimal) -> Result<Decimal> {
    if amount > MAX_AMOUNT {
        return Err(PharmacyError::invalid(format!(
            "{what} must not exceed {MAX_AMOUNT}"
        )));
    }
    Ok(amount)
}

/// Line subtotal: `price × quantity`.
///
/// # Errors
///
/// Returns [`PharmacyError::InvalidInput`] if the product overflows or is
/// above [`MAX_AMOUNT`].
pub fn subtotal(price: Decimal, quantity: i32) -> Result<Decimal> {
    let amount = price
        .checked_mul(Decimal::from(quantity))
        .ok_or_else(|| PharmacyError::invalid("Subtotal is out of range"))?;
    ensure_storable("Subtotal", to_currency(amount))
}

/// Sum of amounts, normalized to currency scale (`0.00` for an empty input).
///
/// Saturates at [`Decimal::MAX`] instead of overflowing; callers that
/// persist the result check it with [`ensure_storable`].
pub fn sum<I>(amounts: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    to_currency(
        amounts
            .into_iter()
            .fold(Decimal::ZERO, Decimal::saturating_add),
    )
}
