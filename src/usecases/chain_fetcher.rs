//! Chain Fetcher - Concurrent Two-Sided Option Chain Assembly
//!
//! Dispatches one request per contract side at the same time, waits for
//! all of them under one shared deadline, and merges the partial chains
//! into a single chain with both side maps present.
//!
//! Per fetch: `Dispatched` -> `AwaitingAll` -> `Merged` | `TimedOut` |
//! `Failed`. Only `Merged` returns a chain. A slot that fails (transport
//! error, non-200, undecodable body) is logged and treated as absent,
//! and an absent slot fails the whole fetch. A credential failure on any
//! slot aborts the others immediately.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::Instant;
use tracing::{debug, error, instrument, warn};

use crate::adapters::codec;
use crate::domain::{ContractSide, OptionChain};
use crate::error::{ChainError, SlotSide};
use crate::ports::transport::{HttpRequest, Transport};
use crate::usecases::failure::FailurePolicy;
use crate::usecases::handle::{ChainHandle, TaskHandle};

/// One chain request and the contract side it asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainRequest {
  /// Side the request filters on; `None` when the request is not filtered
  /// or the caller does not know.
  pub side: Option<ContractSide>,
  pub request: HttpRequest,
}

impl ChainRequest {
  pub const fn tagged(side: ContractSide, request: HttpRequest) -> Self {
    Self {
      side: Some(side),
      request,
    }
  }

  pub const fn untagged(request: HttpRequest) -> Self {
    Self {
      side: None,
      request,
    }
  }
}

/// Result of one dispatched slot.
#[derive(Debug)]
enum SlotOutcome {
  Chain(OptionChain),
  Absent,
  CredentialRejected(String),
}

/// Aborts every slot task when dropped, so a timed-out or cancelled fetch
/// never leaves requests running.
struct SlotGuard(Vec<AbortHandle>);

impl Drop for SlotGuard {
  fn drop(&mut self) {
    for handle in &self.0 {
      handle.abort();
    }
  }
}

/// Fetches and merges option chains over a shared transport.
#[derive(Clone)]
pub struct ChainFetcher {
  transport: Arc<dyn Transport>,
  policy: Arc<FailurePolicy>,
  /// Shared deadline for all slots of one fetch.
  timeout: Duration,
}

impl ChainFetcher {
  pub fn new(transport: Arc<dyn Transport>, policy: Arc<FailurePolicy>, timeout: Duration) -> Self {
    Self {
      transport,
      policy,
      timeout,
    }
  }

  pub const fn timeout(&self) -> Duration {
    self.timeout
  }

  /// Dispatch one or two requests concurrently and merge their chains.
  ///
  /// With two requests tagged for different sides, each side map is taken
  /// from the slot that asked for it. Otherwise the first slot is the base:
  /// if its call map is empty it receives the second slot's calls, else it
  /// receives the second slot's puts. A single request yields its chain
  /// with any missing side map defaulted to empty.
  ///
  /// # Errors
  /// - `InvalidRequestCount` for zero or more than two requests
  /// - `TimedOut` when the shared deadline passes before every slot finishes
  /// - `InvalidCredential` when any slot reports a dead credential
  /// - `Unavailable` when any slot produced no chain
  #[instrument(skip_all, fields(slots = requests.len(), timeout_ms = self.timeout_ms()))]
  pub async fn fetch(&self, requests: Vec<ChainRequest>) -> Result<OptionChain, ChainError> {
    if requests.is_empty() || requests.len() > 2 {
      return Err(ChainError::InvalidRequestCount(requests.len()));
    }

    let deadline = Instant::now() + self.timeout;
    let sides: Vec<Option<ContractSide>> = requests.iter().map(|r| r.side).collect();

    let handles: Vec<JoinHandle<SlotOutcome>> = requests
      .into_iter()
      .enumerate()
      .map(|(slot, request)| {
        let transport = Arc::clone(&self.transport);
        let policy = Arc::clone(&self.policy);
        tokio::spawn(fetch_slot(transport, policy, slot, request))
      })
      .collect();
    let guard = SlotGuard(handles.iter().map(JoinHandle::abort_handle).collect());

    let mut pending: FuturesUnordered<_> = handles
      .into_iter()
      .enumerate()
      .map(|(slot, handle)| async move { (slot, handle.await) })
      .collect();
    let mut outcomes: Vec<Option<SlotOutcome>> = sides.iter().map(|_| None).collect();

    loop {
      match tokio::time::timeout_at(deadline, pending.next()).await {
        Ok(Some((slot, joined))) => {
          let outcome = match joined {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => return Err(ChainError::Aborted),
            Err(e) => {
              error!(slot, error = %e, "Chain slot task panicked");
              SlotOutcome::Absent
            }
          };
          if let SlotOutcome::CredentialRejected(detail) = outcome {
            drop(guard);
            self.policy.raise(&detail);
            return Err(ChainError::InvalidCredential(detail));
          }
          if let Some(entry) = outcomes.get_mut(slot) {
            *entry = Some(outcome);
          }
        }
        Ok(None) => break,
        Err(_) => {
          let outstanding = pending.len();
          drop(guard);
          warn!(outstanding, "Option chain fetch timed out, abandoning outstanding slots");
          return Err(ChainError::TimedOut {
            timeout_ms: self.timeout_ms(),
          });
        }
      }
    }

    merge_slots(outcomes, &sides)
  }

  /// Dispatch one unfiltered request; both side maps come from its body.
  ///
  /// # Errors
  /// Same as [`fetch`](Self::fetch) for a single slot.
  pub async fn fetch_single(&self, request: HttpRequest) -> Result<OptionChain, ChainError> {
    self.fetch(vec![ChainRequest::untagged(request)]).await
  }

  /// Start a fetch without waiting for it.
  ///
  /// Must be called from within a tokio runtime.
  pub fn spawn(&self, requests: Vec<ChainRequest>) -> ChainHandle {
    let fetcher = self.clone();
    TaskHandle::spawn(async move { fetcher.fetch(requests).await })
  }

  fn timeout_ms(&self) -> u64 {
    u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
  }
}

impl std::fmt::Debug for ChainFetcher {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ChainFetcher")
      .field("timeout", &self.timeout)
      .finish_non_exhaustive()
  }
}

async fn fetch_slot(
  transport: Arc<dyn Transport>,
  policy: Arc<FailurePolicy>,
  slot: usize,
  request: ChainRequest,
) -> SlotOutcome {
  let side = SlotSide::from(request.side);

  let response = match transport.execute(request.request).await {
    Ok(response) => response,
    Err(error) => {
      warn!(slot, %side, %error, "Chain slot request failed");
      return SlotOutcome::Absent;
    }
  };

  if !response.is_ok() {
    let body = response.text();
    if let Some(detail) = policy.credential_failure(response.status, &body) {
      return SlotOutcome::CredentialRejected(detail);
    }
    warn!(slot, %side, status = response.status, "Chain slot returned non-200");
    return SlotOutcome::Absent;
  }

  match codec::decode::<OptionChain>(&response.body) {
    Ok(chain) => {
      debug!(slot, %side, contracts = chain.contract_count(), "Chain slot decoded");
      SlotOutcome::Chain(chain)
    }
    Err(error) => {
      let body = response.text();
      if let Some(detail) = policy.credential_failure(response.status, &body) {
        return SlotOutcome::CredentialRejected(detail);
      }
      error!(slot, %side, %error, "Could not retrieve option chain");
      SlotOutcome::Absent
    }
  }
}

fn merge_slots(
  outcomes: Vec<Option<SlotOutcome>>,
  sides: &[Option<ContractSide>],
) -> Result<OptionChain, ChainError> {
  let mut chains = Vec::with_capacity(outcomes.len());
  for (slot, outcome) in outcomes.into_iter().enumerate() {
    match outcome {
      Some(SlotOutcome::Chain(chain)) => chains.push(chain),
      _ => {
        let side = SlotSide::from(sides.get(slot).copied().flatten());
        return Err(ChainError::Unavailable { slot, side });
      }
    }
  }

  let mut chains = chains.into_iter();
  let Some(mut base) = chains.next() else {
    return Err(ChainError::InvalidRequestCount(0));
  };

  let merged = match (chains.next(), sides) {
    (None, _) => {
      base.fill_missing_sides();
      base
    }
    (Some(other), [Some(first), Some(second)]) if first != second => base.merge_tagged(*first, other),
    (Some(other), _) => base.merge_inferred(other),
  };

  debug!(
    calls = merged.calls().len(),
    puts = merged.puts().len(),
    "Option chain merged"
  );
  Ok(merged)
}
