//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires from
//! the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `Transport`: async execution of HTTP request descriptors
//! - `FatalSignal`: host notification when a credential is rejected

pub mod fatal;
pub mod transport;
