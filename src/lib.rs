//! sleet-api - Typed Brokerage REST Client
//!
//! Quotes, option chains, price history, movers, OAuth and order
//! management over one shared HTTP transport. Two-sided option chains are
//! fetched with concurrent CALL and PUT requests under a single timeout
//! and merged before they reach the caller.
//!
//! Layout follows a ports-and-adapters split: `domain` holds pure value
//! types, `ports` the transport and fatal-signal seams, `adapters` the
//! reqwest transport and codec, `usecases` the services, and `client`
//! wires them together.

pub mod adapters;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod usecases;

pub use client::BrokerClient;
pub use config::{ApiProfile, ClientConfig, Credentials, ProfileKind};
pub use error::{ApiError, ChainError, TransportError};
