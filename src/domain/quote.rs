//! Equity Quote Types
//!
//! One type covers both API revisions. The newer revision nests prices in
//! a `quote` object (`bidPrice`, `askPrice`, `lastPrice`) with a
//! `reference` block; the older one sends the same prices flat on the
//! instrument (`bidPrice` or `bid`). Flat fields land in [`FlatQuote`] via
//! serde aliases, nested ones in [`EquityQuote`].

use serde::{Deserialize, Serialize};

use super::lenient::{f64_lenient, i64_lenient};

/// Quote snapshot for a single ticker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Equity {
    pub symbol: Option<String>,
    pub description: Option<String>,
    pub asset_main_type: Option<String>,
    pub asset_sub_type: Option<String>,
    pub quote_type: Option<String>,
    pub realtime: bool,
    pub ssid: i64,
    /// Nested quote block (newer revision).
    pub quote: Option<EquityQuote>,
    /// Reference data block (newer revision).
    pub reference: Option<Reference>,
    /// Flat price fields (older revision).
    #[serde(flatten)]
    pub flat: FlatQuote,
}

/// Price fields published directly on the instrument.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlatQuote {
    #[serde(alias = "bidPrice", deserialize_with = "f64_lenient")]
    pub bid: f64,
    #[serde(alias = "askPrice", deserialize_with = "f64_lenient")]
    pub ask: f64,
    #[serde(alias = "lastPrice", deserialize_with = "f64_lenient")]
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
    pub volatility: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub net_change: f64,
    #[serde(rename = "52WkHigh", deserialize_with = "f64_lenient")]
    pub fifty_two_week_high: f64,
    #[serde(rename = "52WkLow", deserialize_with = "f64_lenient")]
    pub fifty_two_week_low: f64,
}

/// Nested quote block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EquityQuote {
    #[serde(rename = "52WeekHigh", deserialize_with = "f64_lenient")]
    pub fifty_two_week_high: f64,
    #[serde(rename = "52WeekLow", deserialize_with = "f64_lenient")]
    pub fifty_two_week_low: f64,
    #[serde(rename = "askMICId")]
    pub ask_mic_id: Option<String>,
    #[serde(deserialize_with = "f64_lenient")]
    pub ask_price: f64,
    #[serde(deserialize_with = "i64_lenient")]
    pub ask_size: i64,
    pub ask_time: i64,
    #[serde(rename = "bidMICId")]
    pub bid_mic_id: Option<String>,
    #[serde(deserialize_with = "f64_lenient")]
    pub bid_price: f64,
    #[serde(deserialize_with = "i64_lenient")]
    pub bid_size: i64,
    pub bid_time: i64,
    #[serde(deserialize_with = "f64_lenient")]
    pub close_price: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub high_price: f64,
    #[serde(rename = "lastMICId")]
    pub last_mic_id: Option<String>,
    #[serde(deserialize_with = "f64_lenient")]
    pub last_price: f64,
    #[serde(deserialize_with = "i64_lenient")]
    pub last_size: i64,
    #[serde(deserialize_with = "f64_lenient")]
    pub low_price: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub mark: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub mark_change: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub mark_percent_change: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub net_change: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub net_percent_change: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub open_price: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub post_market_change: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub post_market_percent_change: f64,
    pub quote_time: i64,
    pub security_status: Option<String>,
    #[serde(deserialize_with = "i64_lenient")]
    pub total_volume: i64,
    pub trade_time: i64,
}

/// Reference data block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Reference {
    pub cusip: Option<String>,
    pub description: Option<String>,
    pub exchange: Option<String>,
    pub exchange_name: Option<String>,
    #[serde(deserialize_with = "f64_lenient")]
    pub htb_rate: f64,
}

impl Equity {
    /// Last trade price, preferring the nested block when present.
    pub fn last_price(&self) -> f64 {
        self.quote.as_ref().map_or(self.flat.last, |q| q.last_price)
    }

    pub fn bid_price(&self) -> f64 {
        self.quote.as_ref().map_or(self.flat.bid, |q| q.bid_price)
    }

    pub fn ask_price(&self) -> f64 {
        self.quote.as_ref().map_or(self.flat.ask, |q| q.ask_price)
    }

    pub fn fifty_two_week_low(&self) -> f64 {
        self.quote
            .as_ref()
            .map_or(self.flat.fifty_two_week_low, |q| q.fifty_two_week_low)
    }

    pub fn fifty_two_week_high(&self) -> f64 {
        self.quote
            .as_ref()
            .map_or(self.flat.fifty_two_week_high, |q| q.fifty_two_week_high)
    }
}

impl std::fmt::Display for Equity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol.as_deref().unwrap_or_default())
    }
}
