//! Money arithmetic using decimal amounts.
//!
//! The garage bills in a single currency, so amounts are plain
//! [`Decimal`] values with two decimal places.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places kept on every amount.
pub const MONEY_SCALE: u32 = 2;

/// Round an amount to two decimal places, midpoint away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Clamp an additional charge to be non-negative.
///
/// Negative charges are treated as no charge rather than a discount.
#[must_use]
pub fn clamp_charge(charge: Decimal) -> Decimal {
    if charge.is_sign_negative() {
        Decimal::ZERO
    } else {
        charge
    }
}

/// Compute an invoice total from the service price and an additional charge.
///
/// The charge is clamped to zero first; the result is rounded to two decimal
/// places and never negative.
///
/// ```
/// use garage_core::compute_total;
/// use rust_decimal::Decimal;
///
/// let total = compute_total(Decimal::new(10000, 2), Decimal::new(2550, 2));
/// assert_eq!(total, Decimal::new(12550, 2));
///
/// let clamped = compute_total(Decimal::new(10000, 2), Decimal::new(-10, 0));
/// assert_eq!(clamped, Decimal::new(10000, 2));
/// ```
#[must_use]
pub fn compute_total(service_price: Decimal, additional_charge: Decimal) -> Decimal {
    let total = round_money(service_price + clamp_charge(additional_charge));
    total.max(Decimal::ZERO)
}

/// Format an amount for display with the garage's currency prefix.
#[must_use]
pub fn format_money(amount: Decimal) -> String {
    format!("Rs. {:.2}", round_money(amount))
}
