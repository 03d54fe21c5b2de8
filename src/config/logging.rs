//! Tracing initialisation for hosts that do not bring their own subscriber.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Install a global `fmt` subscriber.
///
/// `RUST_LOG` wins over `level` when set. JSON output matches what log
/// shippers expect; plain output is for terminals.
///
/// # Errors
/// Returns error if a global subscriber is already installed.
pub fn init_tracing(level: &str, json: bool) -> Result<()> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
  let builder = tracing_subscriber::fmt().with_env_filter(filter);

  let installed = if json {
    builder.json().try_init()
  } else {
    builder.try_init()
  };

  installed.map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {e}"))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_second_init_is_an_error() {
    let _ = init_tracing("debug", true);
    assert!(init_tracing("debug", false).is_err());
  }
}
