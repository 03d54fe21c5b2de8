//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies. Each sub-module groups adapters by
//! infrastructure concern.
//!
//! Adapter categories:
//! - `http`: reqwest-backed transport and request descriptor factory
//! - `codec`: JSON decoding of upstream payloads

pub mod codec;
pub mod http;
