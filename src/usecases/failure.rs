//! Failure Policy - Credential Detection and Fatal Signalling
//!
//! Ordinary transport, status and decode failures are logged by the
//! caller and recovered. A dead credential is different: it is reported
//! once through the host's [`FatalSignal`] and surfaced as a typed
//! `InvalidCredential` error.

use std::sync::Arc;

use tracing::error;

use crate::ports::fatal::{FatalSignal, LogFatal};

/// Status the upstream returns for a missing or expired bearer token.
const UNAUTHORIZED: u16 = 401;

/// Longest body excerpt carried in a credential failure detail.
const DETAIL_LIMIT: usize = 256;

/// Decides which failures are credential failures and reports them.
pub struct FailurePolicy {
  /// Body fragments that mark a dead credential.
  markers: Vec<String>,
  /// Host hook.
  signal: Arc<dyn FatalSignal>,
}

impl FailurePolicy {
  pub fn new(markers: Vec<String>, signal: Arc<dyn FatalSignal>) -> Self {
    Self { markers, signal }
  }

  /// Credential failure detail for a failed response, if it is one.
  ///
  /// A 401 is always a credential failure; any other status is one when
  /// the body carries a configured marker.
  pub fn credential_failure(&self, status: u16, body: &str) -> Option<String> {
    let marked = self.markers.iter().any(|marker| body.contains(marker.as_str()));
    (status == UNAUTHORIZED || marked).then(|| detail(status, body))
  }

  /// Log and hand the failure to the host hook.
  pub fn raise(&self, detail: &str) {
    error!(detail, "Credential failure, raising fatal signal");
    self.signal.credential_rejected(detail);
  }
}

impl Default for FailurePolicy {
  fn default() -> Self {
    Self::new(crate::config::ClientConfig::default().credential_error_markers, Arc::new(LogFatal))
  }
}

impl std::fmt::Debug for FailurePolicy {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("FailurePolicy")
      .field("markers", &self.markers)
      .finish_non_exhaustive()
  }
}

fn detail(status: u16, body: &str) -> String {
  let excerpt: String = body.chars().take(DETAIL_LIMIT).collect();
  format!("status {status}: {excerpt}")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ports::fatal::MockFatalSignal;

  #[test]
  fn test_marker_in_body_is_credential_failure() {
    let policy = FailurePolicy::default();
    let detail = policy
      .credential_failure(500, r#"{"error":"InvalidApiKey"}"#)
      .unwrap();
    assert!(detail.starts_with("status 500"));
    assert!(detail.contains("InvalidApiKey"));
  }

  #[test]
  fn test_unauthorized_is_credential_failure() {
    assert!(FailurePolicy::default().credential_failure(401, "").is_some());
  }

  #[test]
  fn test_plain_failures_are_not_credential_failures() {
    let policy = FailurePolicy::default();
    assert!(policy.credential_failure(500, "Internal Server Error").is_none());
    assert!(policy.credential_failure(404, "").is_none());
  }

  #[test]
  fn test_detail_is_truncated() {
    let body = "x".repeat(10_000);
    let detail = FailurePolicy::default().credential_failure(401, &body).unwrap();
    assert!(detail.len() < 300);
  }

  #[test]
  fn test_raise_calls_hook_once() {
    let mut signal = MockFatalSignal::new();
    signal
      .expect_credential_rejected()
      .withf(|detail| detail.contains("token_expired"))
      .times(1)
      .return_const(());
    let policy = FailurePolicy::new(vec!["token_expired".into()], Arc::new(signal));
    policy.raise("status 401: token_expired");
  }
}
