//! Price history and movers payloads.

use serde::{Deserialize, Serialize};

use super::lenient::{f64_lenient, i64_lenient};

/// One OHLCV bar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Candle {
    #[serde(deserialize_with = "f64_lenient")]
    pub open: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub high: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub low: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub close: f64,
    #[serde(deserialize_with = "i64_lenient")]
    pub volume: i64,
    /// Bar open time, epoch milliseconds.
    #[serde(deserialize_with = "i64_lenient")]
    pub datetime: i64,
}

/// Price history response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Candles {
    pub symbol: Option<String>,
    pub empty: bool,
    pub candles: Vec<Candle>,
}

impl Candles {
    /// Close of the most recent bar.
    pub fn last_close(&self) -> Option<f64> {
        self.candles.last().map(|c| c.close)
    }
}

/// Price history window and bar size.
///
/// `start_date`/`end_date` are epoch milliseconds; when set they take
/// precedence over `period` upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceHistoryQuery {
    pub period_type: String,
    pub period: String,
    pub frequency_type: String,
    pub frequency: String,
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
}

impl PriceHistoryQuery {
    pub fn new(
        period_type: impl Into<String>,
        period: impl Into<String>,
        frequency_type: impl Into<String>,
        frequency: impl Into<String>,
    ) -> Self {
        Self {
            period_type: period_type.into(),
            period: period.into(),
            frequency_type: frequency_type.into(),
            frequency: frequency.into(),
            start_date: None,
            end_date: None,
        }
    }

    #[must_use]
    pub fn with_range(mut self, start_date: i64, end_date: i64) -> Self {
        self.start_date = Some(start_date);
        self.end_date = Some(end_date);
        self
    }

    /// One month of daily bars.
    pub fn daily_month() -> Self {
        Self::new("month", "1", "daily", "1")
    }
}

/// Movers response for an index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Screener {
    pub screeners: Vec<Mover>,
}

/// A security flagged for notable price or volume activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Mover {
    #[serde(deserialize_with = "f64_lenient")]
    pub change: f64,
    pub description: Option<String>,
    pub direction: Option<String>,
    #[serde(deserialize_with = "f64_lenient")]
    pub last: f64,
    pub symbol: Option<String>,
    #[serde(deserialize_with = "i64_lenient")]
    pub total_volume: i64,
}
