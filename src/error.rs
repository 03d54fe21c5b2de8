//! Error taxonomy.
//!
//! Transport and decode failures on a chain slot are recovered as an absent
//! slot and only surface through [`ChainError`] when they sink the whole
//! fetch. Single-call paths surface them through [`ApiError`]. A rejected
//! credential is the one fatal condition: it is reported through the
//! configured [`FatalSignal`](crate::ports::fatal::FatalSignal) and then
//! returned as an `InvalidCredential` variant so the host decides whether
//! to exit.

use thiserror::Error;

use crate::domain::ContractSide;

/// A request could not be executed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },
}

/// Failure of a merged option-chain fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("option chain timed out after {timeout_ms} ms")]
    TimedOut { timeout_ms: u64 },
    #[error("option chain unavailable: slot {slot} ({side}) returned no chain")]
    Unavailable { slot: usize, side: SlotSide },
    #[error("credential rejected while fetching option chain: {0}")]
    InvalidCredential(String),
    #[error("option chain fetch needs 1 or 2 requests, got {0}")]
    InvalidRequestCount(usize),
    #[error("option chain fetch was cancelled")]
    Aborted,
}

impl ChainError {
    /// Whether the error means the credential is dead.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidCredential(_))
    }
}

/// Side label of a chain slot for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotSide {
    Tagged(ContractSide),
    Untagged,
}

impl From<Option<ContractSide>> for SlotSide {
    fn from(side: Option<ContractSide>) -> Self {
        side.map_or(Self::Untagged, Self::Tagged)
    }
}

impl std::fmt::Display for SlotSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tagged(side) => write!(f, "{side}"),
            Self::Untagged => f.write_str("untagged"),
        }
    }
}

/// Failure of a single-call API path.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
    #[error("response has no entry for {0}")]
    MissingSymbol(String),
    #[error("credential rejected: {0}")]
    InvalidCredential(String),
    #[error("request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },
    #[error("call was cancelled before it completed")]
    Aborted,
    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl ApiError {
    /// Whether the error means the credential is dead.
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredential(_) | Self::Chain(ChainError::InvalidCredential(_))
        )
    }
}
