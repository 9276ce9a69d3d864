//! Run-scoped cancellation.
//!
//! Each pipeline run carries one `CancelToken`; the orchestrator keeps the
//! matching `CancelHandle` in its session registry. The token is observed at
//! every suspension point (backoff sleeps and backend calls) so an external
//! abort interrupts an in-flight retry loop without leaving partially
//! committed stage output behind.

use tokio::sync::watch;

/// Creates a linked cancel handle/token pair for one pipeline run.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

/// Write side of the cancellation signal, held by the session registry.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Requests cancellation of the run. Idempotent.
    pub fn cancel(&self) {
        // Receivers observe the value change; send only fails when every
        // token is gone, which makes cancellation a no-op anyway.
        let _ = self.tx.send(true);
    }

    /// Returns whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Read side of the cancellation signal, cloned into stages and loops.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Creates a token that can never be cancelled (useful in tests).
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        // Leak the sender so the channel stays open for the token's lifetime.
        std::mem::forget(tx);
        Self { rx }
    }

    /// Returns whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested; pends forever otherwise.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                // Handle dropped without cancelling: this run can no longer
                // be aborted, so the future must never resolve.
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_token_observes_cancel() {
        let (handle, token) = cancel_pair();
        assert!(!token.is_cancelled());

        handle.cancel();
        assert!(token.is_cancelled());
        assert!(handle.is_cancelled());

        // Must resolve promptly once cancelled.
        tokio::time::timeout(Duration::from_secs(1), token.cancelled())
            .await
            .expect("cancelled() should resolve");
    }

    #[tokio::test]
    async fn test_never_token_pends() {
        let token = CancelToken::never();
        assert!(!token.is_cancelled());

        let result = tokio::time::timeout(Duration::from_millis(20), token.cancelled()).await;
        assert!(result.is_err(), "never-token must not resolve");
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let (handle, token) = cancel_pair();
        handle.cancel();
        handle.cancel();
        assert!(token.is_cancelled());
    }
}
