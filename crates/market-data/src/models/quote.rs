use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A live market quote as returned by a provider.
///
/// Only the price is required; the remaining fields are passed through
/// when the provider supplies them.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Current/regular market price (required)
    pub price: Decimal,

    /// Previous session close
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<Decimal>,

    /// Absolute change since previous close
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<Decimal>,

    /// Percentage change since previous close
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<Decimal>,

    /// Market session state (e.g. "REGULAR", "CLOSED", "PRE")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_state: Option<String>,

    /// Quote currency (e.g. "USD")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    /// Exchange name (e.g. "NasdaqGS")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
}

impl Quote {
    /// Create a quote with only a price; all optional fields empty.
    pub fn new(price: Decimal) -> Self {
        Self {
            price,
            previous_close: None,
            change: None,
            change_percent: None,
            market_state: None,
            currency: None,
            exchange: None,
        }
    }
}
