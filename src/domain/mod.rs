//! Domain layer - Brokerage value types.
//!
//! Pure data: option contracts and chains (including the call/put merge
//! rule), ticker and option-symbol parsing, quotes, price history, orders,
//! OAuth tokens and user principals. No I/O happens here.

pub mod chain;
pub mod contract;
pub mod lenient;
pub mod market;
pub mod order;
pub mod principals;
pub mod quote;
pub mod symbol;
pub mod token;

// Re-export core types for convenience
pub use chain::{ExpirationMap, OptionChain, StrikeMap};
pub use contract::{ContractSide, OptionContract};
pub use market::{Candle, Candles, Mover, PriceHistoryQuery, Screener};
pub use order::{Instruction, Order, OrderError, OrderLeg, OrderQuery};
pub use principals::{AccountNumber, PrincipalsError, UserPrincipals};
pub use quote::Equity;
pub use symbol::{normalize_ticker, parse_option_symbol, parse_osi_symbol, OptionSymbol, SymbolError};
pub use token::{Grant, Token};
