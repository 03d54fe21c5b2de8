//! Broker Client - Wiring of Transport, Credentials and Services
//!
//! Wiring sequence:
//! 1. Resolve the `ApiProfile` from `ClientConfig`
//! 2. Build the request factory (base URL, credentials, token slot)
//! 3. Build the failure policy (markers + fatal signal)
//! 4. Share one transport through a dispatcher
//! 5. Hand clones to the quote, auth and trading services

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::adapters::http::{RequestFactory, ReqwestTransport, ReqwestTransportConfig};
use crate::config::{ClientConfig, Credentials};
use crate::error::ApiError;
use crate::ports::fatal::{FatalSignal, LogFatal};
use crate::ports::transport::Transport;
use crate::usecases::{AuthService, Dispatcher, FailurePolicy, QuoteService, TradingService};

/// Entry point for all API operations.
#[derive(Debug, Clone)]
pub struct BrokerClient {
  config: ClientConfig,
  requests: Arc<RequestFactory>,
  quotes: QuoteService,
  auth: AuthService,
  trading: TradingService,
}

impl BrokerClient {
  /// Client over a pooled reqwest transport. Credential failures are
  /// logged and returned as errors.
  ///
  /// # Errors
  /// Returns error if the HTTP client or the base URL is unusable.
  pub fn new(config: ClientConfig, credentials: Credentials) -> Result<Self> {
    Self::with_fatal_signal(config, credentials, Arc::new(LogFatal))
  }

  /// Client over a pooled reqwest transport with a host-supplied fatal hook.
  ///
  /// # Errors
  /// Returns error if the HTTP client or the base URL is unusable.
  pub fn with_fatal_signal(
    config: ClientConfig,
    credentials: Credentials,
    signal: Arc<dyn FatalSignal>,
  ) -> Result<Self> {
    let transport = ReqwestTransport::new(ReqwestTransportConfig {
      timeout: config.timeout(),
      ..ReqwestTransportConfig::default()
    })?;
    Self::with_transport(config, credentials, Arc::new(transport), signal)
      .context("Failed to build broker client")
  }

  /// Client over any transport.
  ///
  /// # Errors
  /// `InvalidUrl` if the profile's base URL does not parse.
  pub fn with_transport(
    config: ClientConfig,
    credentials: Credentials,
    transport: Arc<dyn Transport>,
    signal: Arc<dyn FatalSignal>,
  ) -> Result<Self, ApiError> {
    let profile = config.api_profile();
    info!(
      profile = ?profile.kind,
      base_url = %profile.base_url,
      timeout_ms = config.timeout_ms,
      "Creating broker client"
    );

    let requests = Arc::new(RequestFactory::new(profile, credentials)?);
    let policy = Arc::new(FailurePolicy::new(config.credential_error_markers.clone(), signal));
    let dispatcher = Dispatcher::new(transport, policy, config.timeout());

    Ok(Self {
      quotes: QuoteService::new(dispatcher.clone(), Arc::clone(&requests), config.default_strike_count),
      auth: AuthService::new(dispatcher.clone(), Arc::clone(&requests), config.redirect_uri.clone()),
      trading: TradingService::new(dispatcher, Arc::clone(&requests)),
      requests,
      config,
    })
  }

  pub const fn config(&self) -> &ClientConfig {
    &self.config
  }

  pub const fn quotes(&self) -> &QuoteService {
    &self.quotes
  }

  pub const fn auth(&self) -> &AuthService {
    &self.auth
  }

  pub const fn trading(&self) -> &TradingService {
    &self.trading
  }

  /// Install an access token obtained elsewhere.
  pub async fn set_access_token(&self, token: impl Into<String>) {
    self.requests.set_access_token(token).await;
  }

  pub async fn access_token(&self) -> Option<String> {
    self.requests.access_token().await
  }
}
