//! Task handles for non-blocking calls.
//!
//! A handle owns a spawned tokio task. Awaiting it yields the call's
//! result; `cancel` aborts the task, and a cancelled handle resolves to
//! the error type's cancellation variant instead of panicking.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;
use tracing::error;

use crate::domain::OptionChain;
use crate::error::{ApiError, ChainError};

/// Error types that can represent a cancelled task.
pub trait Cancelled {
  fn cancelled() -> Self;
}

impl Cancelled for ChainError {
  fn cancelled() -> Self {
    Self::Aborted
  }
}

impl Cancelled for ApiError {
  fn cancelled() -> Self {
    Self::Aborted
  }
}

/// Awaitable, cancelable handle to a spawned call.
#[derive(Debug)]
pub struct TaskHandle<T, E> {
  inner: JoinHandle<Result<T, E>>,
}

/// Handle to a spawned option-chain fetch.
pub type ChainHandle = TaskHandle<OptionChain, ChainError>;

impl<T, E> TaskHandle<T, E>
where
  T: Send + 'static,
  E: Send + 'static,
{
  /// Spawn `call` on the current runtime.
  pub fn spawn<F>(call: F) -> Self
  where
    F: Future<Output = Result<T, E>> + Send + 'static,
  {
    Self {
      inner: tokio::spawn(call),
    }
  }
}

impl<T, E> TaskHandle<T, E> {
  /// Abort the call. Outstanding requests are abandoned.
  pub fn cancel(&self) {
    self.inner.abort();
  }

  pub fn is_finished(&self) -> bool {
    self.inner.is_finished()
  }
}

impl<T, E: Cancelled> Future for TaskHandle<T, E> {
  type Output = Result<T, E>;

  fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    Pin::new(&mut self.inner).poll(cx).map(|joined| match joined {
      Ok(result) => result,
      Err(e) if e.is_cancelled() => Err(E::cancelled()),
      Err(e) => {
        error!(error = %e, "Spawned call panicked");
        Err(E::cancelled())
      }
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  #[tokio::test]
  async fn test_handle_yields_result() {
    let handle: TaskHandle<u32, ChainError> = TaskHandle::spawn(async { Ok(7) });
    assert_eq!(handle.await, Ok(7));
  }

  #[tokio::test]
  async fn test_handle_pending_until_call_completes() {
    let (tx, rx) = tokio::sync::oneshot::channel::<u32>();
    let mut handle = tokio_test::task::spawn(TaskHandle::<u32, ChainError>::spawn(async move {
      rx.await.map_err(|_| ChainError::Aborted)
    }));
    tokio_test::assert_pending!(handle.poll());
    tx.send(3).unwrap();
    assert_eq!(handle.await, Ok(3));
  }

  #[tokio::test]
  async fn test_cancelled_handle_resolves_to_aborted() {
    let handle: ChainHandle = TaskHandle::spawn(async {
      tokio::time::sleep(Duration::from_secs(30)).await;
      Ok(OptionChain::default())
    });
    assert!(!handle.is_finished());
    handle.cancel();
    assert_eq!(handle.await, Err(ChainError::Aborted));
  }

  #[tokio::test]
  async fn test_cancelled_api_call_resolves_to_api_aborted() {
    let handle: TaskHandle<u32, ApiError> = TaskHandle::spawn(async {
      tokio::time::sleep(Duration::from_secs(30)).await;
      Ok(1)
    });
    handle.cancel();
    let err = handle.await.unwrap_err();
    assert!(matches!(err, ApiError::Aborted));
    assert!(!err.is_fatal());
  }
}
