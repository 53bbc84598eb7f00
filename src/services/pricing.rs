//! Money arithmetic for carts and orders.
//!
//! Every amount is a [`Decimal`] rounded half-up to two places. Nothing in
//! this module touches storage, so totals can be recomputed from a frozen
//! items snapshot at any time.

use crate::entities::order::ItemsSnapshot;
use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept for money values
pub const MONEY_SCALE: u32 = 2;

/// Rounds half-up (away from zero) to two decimal places.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

fn percent_factor(discount_percent: i32) -> Decimal {
    Decimal::ONE - Decimal::from(discount_percent) / Decimal::ONE_HUNDRED
}

/// `unit_price * (1 - discount_percent / 100) * quantity`, rounded.
pub fn line_amount(unit_price: Decimal, discount_percent: i32, quantity: i32) -> Decimal {
    round_money(unit_price * percent_factor(discount_percent) * Decimal::from(quantity))
}

/// Sum of already-rounded line amounts.
pub fn cart_total<I>(line_amounts: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    round_money(line_amounts.into_iter().sum())
}

/// Applies a whole-percent promo discount to a total.
pub fn apply_promo(total: Decimal, discount_percent: i32) -> Decimal {
    round_money(total * percent_factor(discount_percent))
}

/// Undiscounted total of a frozen items snapshot.
pub fn snapshot_subtotal(items: &ItemsSnapshot) -> Decimal {
    cart_total(items.lines().iter().map(|line| line.line_amount))
}

/// Order total from its snapshot.
///
/// `promo_discount` is the discount of the order's promo if it still
/// resolves; when it does not, the undiscounted total is returned.
pub fn order_total(items: &ItemsSnapshot, promo_discount: Option<i32>) -> Decimal {
    let subtotal = snapshot_subtotal(items);
    match promo_discount {
        Some(percent) => apply_promo(subtotal, percent),
        None => subtotal,
    }
}
