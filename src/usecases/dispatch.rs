//! Single-call dispatch with the shared timeout and failure policy.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::ApiError;
use crate::ports::transport::{HttpRequest, HttpResponse, Transport};
use crate::usecases::chain_fetcher::ChainFetcher;
use crate::usecases::failure::FailurePolicy;

/// Sends one request at a time for the non-chain services.
#[derive(Clone)]
pub struct Dispatcher {
  transport: Arc<dyn Transport>,
  policy: Arc<FailurePolicy>,
  timeout: Duration,
}

impl Dispatcher {
  pub fn new(transport: Arc<dyn Transport>, policy: Arc<FailurePolicy>, timeout: Duration) -> Self {
    Self {
      transport,
      policy,
      timeout,
    }
  }

  /// A chain fetcher sharing this dispatcher's transport, policy and timeout.
  pub fn chain_fetcher(&self) -> ChainFetcher {
    ChainFetcher::new(
      Arc::clone(&self.transport),
      Arc::clone(&self.policy),
      self.timeout,
    )
  }

  /// Send `request` and return the response whatever its status.
  ///
  /// # Errors
  /// - `Timeout` when no response arrives within the shared timeout
  /// - `Transport` when the request could not be executed
  /// - `InvalidCredential` when a failed response reports a dead credential
  pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
    let method = request.method;
    let response = tokio::time::timeout(self.timeout, self.transport.execute(request))
      .await
      .map_err(|_| ApiError::Timeout {
        timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
      })??;

    if response.is_success() {
      debug!(%method, status = response.status, "Upstream call succeeded");
      return Ok(response);
    }

    if let Some(detail) = self.policy.credential_failure(response.status, &response.text()) {
      self.policy.raise(&detail);
      return Err(ApiError::InvalidCredential(detail));
    }
    warn!(%method, status = response.status, "Upstream returned failure status");
    Ok(response)
  }

  /// Send `request` and require a 2xx status.
  ///
  /// # Errors
  /// As [`send`](Self::send), plus `Status` for any non-2xx response.
  pub async fn send_expecting_success(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
    let response = self.send(request).await?;
    if !response.is_success() {
      return Err(ApiError::Status {
        status: response.status,
        body: response.text(),
      });
    }
    Ok(response)
  }
}

impl std::fmt::Debug for Dispatcher {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Dispatcher")
      .field("timeout", &self.timeout)
      .finish_non_exhaustive()
  }
}
