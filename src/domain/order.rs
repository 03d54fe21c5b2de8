//! Order Types — Upstream Order Schema
//!
//! Orders serialise to the broker's JSON order schema: `camelCase` field
//! names with `SCREAMING_SNAKE_CASE` enum values. Plain constructors with
//! validation replace builder objects; optional fields are set with the
//! `with_*` methods.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("instruction {instruction} is not valid for an {kind} order")]
    InvalidInstruction {
        instruction: Instruction,
        kind: AssetType,
    },
    #[error("order quantity must be positive")]
    ZeroQuantity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetType {
    Equity,
    Option,
    Index,
    MutualFund,
    CashEquivalent,
    FixedIncome,
    Currency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplexOrderStrategyType {
    None,
    Covered,
    Vertical,
    BackRatio,
    Calendar,
    Diagonal,
    Straddle,
    Strangle,
    Butterfly,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Duration {
    Day,
    GoodTillCancel,
    FillOrKill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Instruction {
    Buy,
    Sell,
    BuyToCover,
    SellShort,
    BuyToOpen,
    BuyToClose,
    SellToOpen,
    SellToClose,
}

impl Instruction {
    /// Whether this instruction applies to equity legs.
    pub const fn is_equity(self) -> bool {
        matches!(self, Self::Buy | Self::Sell)
    }

    /// Whether this instruction applies to option legs.
    pub const fn is_option(self) -> bool {
        matches!(
            self,
            Self::BuyToOpen | Self::SellToOpen | Self::BuyToClose | Self::SellToClose
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Market,
    Stop,
    Limit,
    StopLimit,
    TrailingStop,
    TrailingStopLimit,
    NetDebit,
    NetCredit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStrategyType {
    Single,
    Oco,
    Trigger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    AwaitingParentOrder,
    AwaitingCondition,
    AwaitingManualReview,
    Accepted,
    AwaitingUrOut,
    PendingActivation,
    Queued,
    Working,
    Rejected,
    PendingCancel,
    Canceled,
    PendingReplace,
    Replaced,
    Filled,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Session {
    Normal,
    Am,
    Pm,
}

macro_rules! display_as_serde {
    ($($ty:ty),* $(,)?) => {
        $(impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let text = serde_json::to_value(self)
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_default();
                f.write_str(&text)
            }
        })*
    };
}

display_as_serde!(AssetType, Instruction, Status, OrderType, Duration, Session);

/// Instrument traded by one leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub symbol: String,
    pub asset_type: AssetType,
}

/// One leg of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLeg {
    pub instruction: Instruction,
    pub quantity: u32,
    pub instrument: Instrument,
}

/// An order ready for submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_type: OrderType,
    pub session: Session,
    pub duration: Duration,
    pub price: f64,
    pub order_strategy_type: OrderStrategyType,
    pub complex_order_strategy_type: ComplexOrderStrategyType,
    pub order_leg_collection: Vec<OrderLeg>,
}

impl Default for Order {
    fn default() -> Self {
        Self {
            order_type: OrderType::Limit,
            session: Session::Normal,
            duration: Duration::Day,
            price: 0.0,
            order_strategy_type: OrderStrategyType::Single,
            complex_order_strategy_type: ComplexOrderStrategyType::None,
            order_leg_collection: Vec::new(),
        }
    }
}

impl Order {
    /// Single-leg equity limit order for the current session. BUY or SELL only.
    pub fn equity(
        symbol: impl Into<String>,
        quantity: u32,
        price: f64,
        instruction: Instruction,
    ) -> Result<Self, OrderError> {
        Self::single_leg(symbol.into(), quantity, price, instruction, AssetType::Equity)
    }

    /// Single-leg option limit order for the current session.
    /// BUY_TO_OPEN, SELL_TO_OPEN, BUY_TO_CLOSE or SELL_TO_CLOSE only.
    pub fn option(
        symbol: impl Into<String>,
        quantity: u32,
        price: f64,
        instruction: Instruction,
    ) -> Result<Self, OrderError> {
        Self::single_leg(symbol.into(), quantity, price, instruction, AssetType::Option)
    }

    fn single_leg(
        symbol: String,
        quantity: u32,
        price: f64,
        instruction: Instruction,
        kind: AssetType,
    ) -> Result<Self, OrderError> {
        let allowed = match kind {
            AssetType::Option => instruction.is_option(),
            _ => instruction.is_equity(),
        };
        if !allowed {
            return Err(OrderError::InvalidInstruction { instruction, kind });
        }
        if quantity == 0 {
            return Err(OrderError::ZeroQuantity);
        }

        Ok(Self {
            price,
            order_leg_collection: vec![OrderLeg {
                instruction,
                quantity,
                instrument: Instrument {
                    symbol,
                    asset_type: kind,
                },
            }],
            ..Self::default()
        })
    }

    #[must_use]
    pub fn with_order_type(mut self, order_type: OrderType) -> Self {
        self.order_type = order_type;
        self
    }

    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    #[must_use]
    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    #[must_use]
    pub fn with_strategy(
        mut self,
        order_strategy_type: OrderStrategyType,
        complex_order_strategy_type: ComplexOrderStrategyType,
    ) -> Self {
        self.order_strategy_type = order_strategy_type;
        self.complex_order_strategy_type = complex_order_strategy_type;
        self
    }

    /// Append a leg, e.g. the second leg of a vertical.
    #[must_use]
    pub fn with_leg(mut self, leg: OrderLeg) -> Self {
        self.order_leg_collection.push(leg);
        self
    }
}

/// Filters for listing orders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderQuery {
    /// ISO-8601 lower bound on entry time.
    pub from_entered_time: Option<String>,
    /// ISO-8601 upper bound on entry time.
    pub to_entered_time: Option<String>,
    pub status: Option<Status>,
    pub max_results: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equity_order_wire_shape() {
        let order = Order::equity("AAPL", 10, 189.5, Instruction::Buy).unwrap();
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["orderType"], "LIMIT");
        assert_eq!(json["session"], "NORMAL");
        assert_eq!(json["duration"], "DAY");
        assert_eq!(json["orderStrategyType"], "SINGLE");
        assert_eq!(json["complexOrderStrategyType"], "NONE");
        let leg = &json["orderLegCollection"][0];
        assert_eq!(leg["instruction"], "BUY");
        assert_eq!(leg["quantity"], 10);
        assert_eq!(leg["instrument"]["assetType"], "EQUITY");
        assert_eq!(leg["instrument"]["symbol"], "AAPL");
    }

    #[test]
    fn test_option_order_rejects_equity_instruction() {
        let err = Order::option("SPY   240920C00550000", 1, 2.5, Instruction::Buy).unwrap_err();
        assert_eq!(
            err,
            OrderError::InvalidInstruction {
                instruction: Instruction::Buy,
                kind: AssetType::Option
            }
        );
        assert_eq!(
            err.to_string(),
            "instruction BUY is not valid for an OPTION order"
        );
    }

    #[test]
    fn test_equity_order_rejects_option_instruction_and_zero_qty() {
        assert!(Order::equity("AAPL", 1, 1.0, Instruction::SellToOpen).is_err());
        assert_eq!(
            Order::equity("AAPL", 0, 1.0, Instruction::Sell).unwrap_err(),
            OrderError::ZeroQuantity
        );
    }

    #[test]
    fn test_fluent_overrides() {
        let order = Order::option("SPY   240920P00500000", 2, 1.1, Instruction::SellToClose)
            .unwrap()
            .with_duration(Duration::GoodTillCancel)
            .with_order_type(OrderType::NetCredit);
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["duration"], "GOOD_TILL_CANCEL");
        assert_eq!(json["orderType"], "NET_CREDIT");
        assert_eq!(json["orderLegCollection"][0]["instruction"], "SELL_TO_CLOSE");
    }
}
