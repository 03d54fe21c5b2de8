//! Configuration Loader - File Loading and Validation
//!
//! Handles loading the client TOML file, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::ClientConfig;

/// Load and validate configuration from a TOML file.
///
/// # Arguments
/// * `path` - Path to the TOML file
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: impl AsRef<Path>) -> Result<ClientConfig> {
  let path = path.as_ref();

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)
    .with_context(|| format!("Invalid config file: {}", path.display()))?;

  info!(
    profile = ?config.profile,
    timeout_ms = config.timeout_ms,
    strike_count = config.default_strike_count,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
///
/// # Errors
/// Returns error if the TOML is malformed or validation fails.
pub fn parse_config(content: &str) -> Result<ClientConfig> {
  let config: ClientConfig = toml::from_str(content)
    .context("Failed to parse client config")?;

  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Positive timeout and strike count
/// - Absolute http(s) base and redirect URLs
/// - Non-empty credential markers
pub fn validate_config(config: &ClientConfig) -> Result<()> {
  anyhow::ensure!(
    config.timeout_ms > 0,
    "timeout_ms must be positive, got {}",
    config.timeout_ms
  );
  anyhow::ensure!(
    config.default_strike_count > 0,
    "default_strike_count must be positive, got {}",
    config.default_strike_count
  );

  let profile = config.api_profile();
  anyhow::ensure!(
    !profile.base_url.is_empty(),
    "Base URL must not be empty"
  );
  anyhow::ensure!(
    is_http_url(&profile.base_url),
    "Base URL must start with http:// or https://, got {}",
    profile.base_url
  );
  anyhow::ensure!(
    profile.base_url.ends_with('/'),
    "Base URL must end with '/', got {}",
    profile.base_url
  );
  anyhow::ensure!(
    is_http_url(&config.redirect_uri),
    "redirect_uri must start with http:// or https://, got {}",
    config.redirect_uri
  );

  anyhow::ensure!(
    config.credential_error_markers.iter().all(|m| !m.is_empty()),
    "credential_error_markers must not contain empty strings"
  );

  Ok(())
}

fn is_http_url(url: &str) -> bool {
  url.starts_with("https://") || url.starts_with("http://")
}
