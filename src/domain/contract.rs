//! Option Contract — Immutable Instrument Snapshot
//!
//! A single option contract as returned inside an option-chain payload.
//! Contracts are decoded once from a response and never mutated; the
//! chain that owns them hands out shared references only.

use serde::{Deserialize, Serialize};

use super::lenient::{f64_lenient, i64_lenient};

/// Contract side of an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractSide {
    Call,
    Put,
}

impl ContractSide {
    /// Both sides, calls first. Chain queries are dispatched in this order.
    pub const ALL: [Self; 2] = [Self::Call, Self::Put];

    /// Value of the `contractType` query parameter for this side.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Call => "CALL",
            Self::Put => "PUT",
        }
    }

    /// The other side.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Call => Self::Put,
            Self::Put => Self::Call,
        }
    }
}

impl std::fmt::Display for ContractSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tradeable option contract snapshot.
///
/// Field names follow the upstream payload (`camelCase`). Unknown fields
/// are ignored and missing fields default to zero values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionContract {
    /// OCC/OSI symbol, e.g. `SPY   240920C00550000`.
    pub symbol: Option<String>,
    pub description: Option<String>,
    pub exchange_name: Option<String>,
    /// `CALL` or `PUT`.
    pub put_call: Option<ContractSide>,
    #[serde(deserialize_with = "f64_lenient")]
    pub bid: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub ask: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub last: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub mark: f64,
    #[serde(deserialize_with = "i64_lenient")]
    pub bid_size: i64,
    #[serde(deserialize_with = "i64_lenient")]
    pub ask_size: i64,
    #[serde(deserialize_with = "i64_lenient")]
    pub last_size: i64,
    #[serde(deserialize_with = "f64_lenient")]
    pub high_price: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub low_price: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub open_price: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub close_price: f64,
    #[serde(deserialize_with = "i64_lenient")]
    pub total_volume: i64,
    #[serde(deserialize_with = "f64_lenient")]
    pub net_change: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub percent_change: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub volatility: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub delta: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub gamma: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub theta: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub vega: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub rho: f64,
    #[serde(deserialize_with = "i64_lenient")]
    pub open_interest: i64,
    #[serde(deserialize_with = "f64_lenient")]
    pub time_value: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub theoretical_option_value: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub theoretical_volatility: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub strike_price: f64,
    /// Expiration timestamp as sent upstream (ISO string or epoch millis).
    pub expiration_date: Option<serde_json::Value>,
    #[serde(deserialize_with = "i64_lenient")]
    pub days_to_expiration: i64,
    pub expiration_type: Option<String>,
    #[serde(deserialize_with = "f64_lenient")]
    pub multiplier: f64,
    pub in_the_money: bool,
    pub non_standard: bool,
}

impl Default for OptionContract {
    fn default() -> Self {
        Self {
            symbol: None,
            description: None,
            exchange_name: None,
            put_call: None,
            bid: 0.0,
            ask: 0.0,
            last: 0.0,
            mark: 0.0,
            bid_size: 0,
            ask_size: 0,
            last_size: 0,
            high_price: 0.0,
            low_price: 0.0,
            open_price: 0.0,
            close_price: 0.0,
            total_volume: 0,
            net_change: 0.0,
            percent_change: 0.0,
            volatility: 0.0,
            delta: 0.0,
            gamma: 0.0,
            theta: 0.0,
            vega: 0.0,
            rho: 0.0,
            open_interest: 0,
            time_value: 0.0,
            theoretical_option_value: 0.0,
            theoretical_volatility: 0.0,
            strike_price: 0.0,
            expiration_date: None,
            days_to_expiration: 0,
            expiration_type: None,
            // Standard equity options cover 100 shares.
            multiplier: 100.0,
            in_the_money: false,
            non_standard: false,
        }
    }
}

impl OptionContract {
    /// Midpoint of bid and ask, or `mark` when either side is missing.
    pub fn mid(&self) -> f64 {
        if self.bid > 0.0 && self.ask > 0.0 {
            (self.bid + self.ask) / 2.0
        } else {
            self.mark
        }
    }

    /// Bid/ask spread in price units.
    pub fn spread(&self) -> f64 {
        (self.ask - self.bid).max(0.0)
    }

    /// Notional value of one contract at mark.
    pub fn notional(&self) -> f64 {
        self.mark * self.multiplier
    }
}

impl std::fmt::Display for OptionContract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} : {}", self.strike_price, self.mark)
    }
}
