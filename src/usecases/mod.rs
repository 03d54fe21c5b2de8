//! Use Cases Layer - Application Logic
//!
//! Orchestrates domain types with the port interfaces to implement the
//! client's operations. Each service owns a cheap clone of the shared
//! dispatcher and request factory.
//!
//! Use cases:
//! - `ChainFetcher`: concurrent two-sided option chain assembly
//! - `Dispatcher`: single calls under the shared timeout
//! - `FailurePolicy`: credential-failure detection and fatal signalling
//! - `QuoteService`: quotes, chains, price history, movers
//! - `AuthService`: OAuth token exchange
//! - `TradingService`: accounts and orders

pub mod auth_service;
pub mod chain_fetcher;
pub mod dispatch;
pub mod failure;
pub mod handle;
pub mod quote_service;
pub mod trading_service;

pub use auth_service::AuthService;
pub use chain_fetcher::{ChainFetcher, ChainRequest};
pub use dispatch::Dispatcher;
pub use failure::FailurePolicy;
pub use handle::{ChainHandle, TaskHandle};
pub use quote_service::QuoteService;
pub use trading_service::TradingService;
