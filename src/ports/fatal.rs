//! Fatal Signal Port - Credential Rejection Hook
//!
//! A rejected or expired credential makes every further call pointless,
//! and for an order-placing client continuing is unsafe. The library does
//! not exit on its own: it tells the host through this hook and returns a
//! typed `InvalidCredential` error. Hosts that want the process to stop
//! install [`ExitProcess`].

use tracing::error;

/// Receives credential-rejection events.
#[cfg_attr(test, mockall::automock)]
pub trait FatalSignal: Send + Sync + 'static {
  /// Called once per failed operation with the upstream failure detail.
  fn credential_rejected(&self, detail: &str);
}

/// Logs the rejection and lets the caller handle the returned error.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFatal;

impl FatalSignal for LogFatal {
  fn credential_rejected(&self, detail: &str) {
    error!(detail, "Credential rejected by upstream API");
  }
}

/// Logs the rejection and terminates the process with status 1.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExitProcess;

impl FatalSignal for ExitProcess {
  fn credential_rejected(&self, detail: &str) {
    error!(detail, "Credential rejected by upstream API, exiting");
    std::process::exit(1);
  }
}
