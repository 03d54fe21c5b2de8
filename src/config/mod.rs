//! Configuration Module - Client Settings and API Profiles
//!
//! Loads and validates client configuration from a TOML file. The two
//! upstream API revisions are described by [`ApiProfile`] presets instead
//! of separate service implementations: endpoints and auth style live
//! here, the services only ask the profile where to go.

pub mod loader;
pub mod logging;

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Default timeout shared by chain fetches and single calls.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;
/// Strikes requested per expiration when the caller gives none.
pub const DEFAULT_STRIKE_COUNT: u32 = 100;
pub const DEFAULT_REDIRECT_URI: &str = "https://127.0.0.1:8443/callback";

pub const APP_KEY_ENV: &str = "SLEET_APP_KEY";
pub const APP_SECRET_ENV: &str = "SLEET_APP_SECRET";

/// Top-level client configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
  /// Upstream API revision.
  pub profile: ProfileKind,
  /// Overrides the profile's base URL (sandbox, proxy, test server).
  pub base_url: Option<String>,
  /// Shared timeout for chain fetches and single calls (milliseconds).
  pub timeout_ms: u64,
  /// Strikes per expiration when the caller gives none.
  pub default_strike_count: u32,
  /// OAuth redirect URI registered with the app.
  pub redirect_uri: String,
  /// Response body fragments that mark a dead credential.
  pub credential_error_markers: Vec<String>,
  /// Log level (trace, debug, info, warn, error).
  pub log_level: String,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      profile: ProfileKind::default(),
      base_url: None,
      timeout_ms: DEFAULT_TIMEOUT_MS,
      default_strike_count: DEFAULT_STRIKE_COUNT,
      redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
      credential_error_markers: default_credential_markers(),
      log_level: "info".to_string(),
    }
  }
}

impl ClientConfig {
  /// Configuration for the given revision with every other field defaulted.
  pub fn for_profile(profile: ProfileKind) -> Self {
    Self {
      profile,
      ..Self::default()
    }
  }

  /// Point every API and token endpoint at `base_url`.
  ///
  /// The browser authorization page is not moved: it lives on the
  /// upstream's login host, which differs from the API host for
  /// TD Ameritrade.
  #[must_use]
  pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
    self.base_url = Some(base_url.into());
    self
  }

  #[must_use]
  pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
    self.timeout_ms = timeout_ms;
    self
  }

  pub const fn timeout(&self) -> Duration {
    Duration::from_millis(self.timeout_ms)
  }

  /// The resolved API profile, with the base URL override applied.
  pub fn api_profile(&self) -> ApiProfile {
    let mut profile = ApiProfile::preset(self.profile);
    if let Some(base_url) = &self.base_url {
      profile.base_url.clone_from(base_url);
    }
    profile
  }
}

/// Selects an [`ApiProfile`] preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
  #[default]
  Schwab,
  TdAmeritrade,
}

/// How market data and trader calls authenticate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
  /// `Authorization: Bearer <access token>` header.
  Bearer,
  /// `apikey=<app key>` query parameter, plus the bearer header when a
  /// token is held.
  ApiKeyQuery,
}

/// How the token endpoint authenticates the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenAuth {
  /// `Authorization: Basic base64(appKey:appSecret)`.
  Basic,
  /// `client_id=<app key>` in the form body.
  ClientId,
}

/// Endpoints and auth style of one upstream API revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiProfile {
  pub kind: ProfileKind,
  /// Root of every endpoint, with trailing slash.
  pub base_url: String,
  /// Prefix for quotes, chains, price history and movers.
  pub market_data_path: &'static str,
  /// Prefix for accounts, orders and user principals.
  pub trader_path: &'static str,
  /// OAuth token endpoint, relative to `base_url`.
  pub token_path: &'static str,
  /// Absolute URL of the browser authorization page. Not affected by a
  /// base URL override.
  pub authorize_url: &'static str,
  pub auth_scheme: AuthScheme,
  pub token_auth: TokenAuth,
}

impl ApiProfile {
  pub const fn schwab() -> Self {
    Self {
      kind: ProfileKind::Schwab,
      base_url: String::new(),
      market_data_path: "marketdata/v1/",
      trader_path: "trader/v1/",
      token_path: "v1/oauth/token",
      authorize_url: "https://api.schwabapi.com/v1/oauth/authorize",
      auth_scheme: AuthScheme::Bearer,
      token_auth: TokenAuth::Basic,
    }
  }

  pub const fn td_ameritrade() -> Self {
    Self {
      kind: ProfileKind::TdAmeritrade,
      base_url: String::new(),
      market_data_path: "marketdata/",
      trader_path: "",
      token_path: "oauth2/token",
      authorize_url: "https://auth.tdameritrade.com/auth",
      auth_scheme: AuthScheme::ApiKeyQuery,
      token_auth: TokenAuth::ClientId,
    }
  }

  /// Preset for a revision, with its public base URL.
  pub fn preset(kind: ProfileKind) -> Self {
    let (mut profile, base_url) = match kind {
      ProfileKind::Schwab => (Self::schwab(), "https://api.schwabapi.com/"),
      ProfileKind::TdAmeritrade => (Self::td_ameritrade(), "https://api.tdameritrade.com/v1/"),
    };
    profile.base_url = base_url.to_string();
    profile
  }
}

/// App key and secret issued by the brokerage.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
  pub app_key: String,
  pub app_secret: String,
}

impl Credentials {
  pub fn new(app_key: impl Into<String>, app_secret: impl Into<String>) -> Self {
    Self {
      app_key: app_key.into(),
      app_secret: app_secret.into(),
    }
  }

  /// Read `SLEET_APP_KEY` and `SLEET_APP_SECRET`.
  ///
  /// # Errors
  /// Returns error if either variable is unset.
  pub fn from_env() -> Result<Self> {
    let app_key = std::env::var(APP_KEY_ENV).with_context(|| format!("{APP_KEY_ENV} not set"))?;
    let app_secret =
      std::env::var(APP_SECRET_ENV).with_context(|| format!("{APP_SECRET_ENV} not set"))?;
    Ok(Self::new(app_key, app_secret))
  }
}

impl fmt::Debug for Credentials {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Credentials")
      .field("app_key", &self.app_key)
      .field("app_secret", &"<redacted>")
      .finish()
  }
}

fn default_credential_markers() -> Vec<String> {
  ["InvalidApiKey", "invalid_token", "token_expired"]
    .into_iter()
    .map(String::from)
    .collect()
}
