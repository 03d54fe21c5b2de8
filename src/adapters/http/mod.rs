//! Brokerage HTTP Adapter
//!
//! Implements the `Transport` port over reqwest and builds the request
//! descriptors every service sends: endpoint URLs for the active API
//! profile, auth headers, form and JSON bodies.
//!
//! Sub-modules:
//! - `client`: pooled reqwest transport
//! - `request`: URL and descriptor factory

pub mod client;
pub mod request;

pub use client::{ReqwestTransport, ReqwestTransportConfig};
pub use request::RequestFactory;
