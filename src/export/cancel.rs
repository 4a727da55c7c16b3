//! Cooperative cancellation of running exports.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
struct Shared {
    cancelled: AtomicBool,
    aborted: Notify,
}

/// Stop request shared between a signal listener and the export loop.
///
/// A cancel is cooperative and only checked between page fetches. An abort
/// additionally wakes [`CancelFlag::aborted`] so the caller can drop a
/// request that is still in flight.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<Shared>);

impl CancelFlag {
    /// Creates a flag that is not set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a stop after the current page.
    pub fn cancel(&self) {
        self.0.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns true once a stop was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.cancelled.load(Ordering::SeqCst)
    }

    /// Requests an immediate stop.
    pub fn abort(&self) {
        self.cancel();
        self.0.aborted.notify_one();
    }

    /// Resolves once [`CancelFlag::abort`] has been called.
    pub async fn aborted(&self) {
        self.0.aborted.notified().await;
    }
}

/// Listens for Ctrl+C on behalf of `flag`.
///
/// The first interrupt cancels: the in-flight request is allowed to finish
/// and the export loop notices the flag before fetching the next page. A
/// second interrupt aborts.
pub fn cancel_on_ctrl_c(flag: CancelFlag) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            return;
        }
        tracing::warn!(
            "Interrupt received, stopping after the current page (Ctrl+C again to abort now)"
        );
        flag.cancel();

        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::warn!("Second interrupt received, abandoning the current request");
                flag.abort();
            }
            Err(e) => tracing::error!(error = %e, "Failed to install Ctrl+C handler"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_clones_share_state() {
        let flag = CancelFlag::new();
        let listener = flag.clone();
        assert!(!listener.is_cancelled());
        flag.cancel();
        assert!(listener.is_cancelled());
    }

    #[tokio::test]
    async fn test_abort_wakes_waiter_and_cancels() {
        let flag = CancelFlag::new();
        let waiter = flag.clone();
        let handle = tokio::spawn(async move { waiter.aborted().await });

        flag.abort();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("abort did not wake the waiter")
            .unwrap();
        assert!(flag.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancel_alone_does_not_abort() {
        let flag = CancelFlag::new();
        flag.cancel();
        let woke = tokio::time::timeout(Duration::from_millis(50), flag.aborted()).await;
        assert!(woke.is_err());
    }
}
