//! Quote validation.
//!
//! A quote must carry a believable price before it is cached or counted
//! as a successful fetch. Decimal cannot represent NaN or infinity, so
//! those provider values are dropped at the float conversion boundary
//! and arrive here as an absent quote.

use rust_decimal::Decimal;

use stockpulse_market_data::Quote;

use crate::constants::MAX_REASONABLE_PRICE;

/// Check whether a fetched quote is usable.
///
/// An absent quote is invalid; a present one is valid when its price is.
pub fn quote_is_valid(quote: Option<&Quote>) -> bool {
    match quote {
        Some(q) => price_is_valid(q.price),
        None => false,
    }
}

/// Check whether a price is positive and within the sanity bound.
///
/// The upper bound itself is still valid; only prices above it are
/// rejected as corrupt.
pub fn price_is_valid(price: Decimal) -> bool {
    price > Decimal::ZERO && price <= Decimal::from(MAX_REASONABLE_PRICE)
}
