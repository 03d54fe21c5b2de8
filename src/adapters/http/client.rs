//! Reqwest Transport - Pooled HTTPS Client
//!
//! One long-lived `reqwest::Client` (rustls, connection pool) shared by
//! every service and every concurrent chain slot. Non-2xx statuses are
//! returned as responses; only failures to get a response are errors.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::ports::transport::{HttpRequest, HttpResponse, Method, Transport};

/// Configuration for the reqwest transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransportConfig {
  /// Per-request timeout enforced by reqwest.
  pub timeout: Duration,
  /// Idle connections kept per host.
  pub pool_max_idle_per_host: usize,
}

impl Default for ReqwestTransportConfig {
  fn default() -> Self {
    Self {
      timeout: Duration::from_millis(crate::config::DEFAULT_TIMEOUT_MS),
      pool_max_idle_per_host: 8,
    }
  }
}

/// HTTP transport backed by a pooled reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
  /// Underlying HTTP client.
  http: Client,
  /// Client configuration.
  config: ReqwestTransportConfig,
}

impl ReqwestTransport {
  /// Create a new transport.
  pub fn new(config: ReqwestTransportConfig) -> Result<Self> {
    let http = Client::builder()
      .timeout(config.timeout)
      .pool_max_idle_per_host(config.pool_max_idle_per_host)
      .use_rustls_tls()
      .build()
      .context("Failed to build HTTP client")?;

    Ok(Self { http, config })
  }

  fn map_error(&self, error: &reqwest::Error) -> TransportError {
    if error.is_timeout() {
      TransportError::Timeout {
        timeout_ms: u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX),
      }
    } else {
      TransportError::Request(error.to_string())
    }
  }
}

const fn to_reqwest(method: Method) -> reqwest::Method {
  match method {
    Method::Get => reqwest::Method::GET,
    Method::Post => reqwest::Method::POST,
    Method::Put => reqwest::Method::PUT,
    Method::Delete => reqwest::Method::DELETE,
  }
}

/// URL without its query string, safe to log.
fn loggable(url: &str) -> &str {
  url.split_once('?').map_or(url, |(path, _)| path)
}

#[async_trait]
impl Transport for ReqwestTransport {
  async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
    let HttpRequest {
      method,
      url,
      headers,
      body,
    } = request;

    let mut builder = self.http.request(to_reqwest(method), &url);
    for (name, value) in &headers {
      builder = builder.header(name, value);
    }
    if let Some(body) = body {
      builder = builder.body(body);
    }

    let started = Instant::now();
    let response = builder.send().await.map_err(|e| {
      warn!(%method, url = loggable(&url), error = %e, "Request failed");
      self.map_error(&e)
    })?;

    let status = response.status().as_u16();
    let body = response
      .bytes()
      .await
      .map_err(|e| self.map_error(&e))?
      .to_vec();

    debug!(
      %method,
      url = loggable(&url),
      status,
      bytes = body.len(),
      elapsed_ms = started.elapsed().as_millis(),
      "HTTP response"
    );

    Ok(HttpResponse { status, body })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_loggable_strips_query() {
    assert_eq!(
      loggable("https://api.example.com/marketdata/chains?apikey=secret"),
      "https://api.example.com/marketdata/chains"
    );
    assert_eq!(loggable("https://api.example.com/"), "https://api.example.com/");
  }

  #[test]
  fn test_method_mapping() {
    assert_eq!(to_reqwest(Method::Put), reqwest::Method::PUT);
    assert_eq!(to_reqwest(Method::Delete), reqwest::Method::DELETE);
  }

  #[test]
  fn test_builds_with_defaults() {
    assert!(ReqwestTransport::new(ReqwestTransportConfig::default()).is_ok());
  }
}
