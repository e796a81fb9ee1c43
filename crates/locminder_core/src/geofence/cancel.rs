//! Cancellation scope tied to the lifetime of a hosting screen.
//!
//! The screen owns a `CancelScope`; each negotiation holds a `CancelToken`.
//! Cancelling (or dropping) the scope is observed by every token, including
//! tokens that start waiting after the fact.

use std::future::Future;
use tokio::sync::watch;

/// Marker returned when a guarded step was cut short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

#[derive(Debug)]
pub struct CancelScope {
    sender: watch::Sender<bool>,
}

impl CancelScope {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender }
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }
}

impl Default for CancelScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CancelScope {
    fn drop(&mut self) {
        self.sender.send_replace(true);
    }
}

#[derive(Debug, Clone)]
pub struct CancelToken {
    receiver: watch::Receiver<bool>,
}

impl CancelToken {
    /// Returns a token that is never cancelled, for background callers such
    /// as restore-after-restart that are not bound to a screen.
    pub fn detached() -> Self {
        let (sender, receiver) = watch::channel(false);
        // A closed channel holding `false` reads as not cancelled.
        drop(sender);
        Self { receiver }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once the scope is cancelled. Never resolves for a detached
    /// token.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        if receiver.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Runs `step` unless the scope is cancelled first or while it runs.
    ///
    /// A step that completes in the same poll as cancellation is discarded.
    pub async fn guard<F: Future>(&self, step: F) -> Result<F::Output, Cancelled> {
        if self.is_cancelled() {
            return Err(Cancelled);
        }
        let output = tokio::select! {
            biased;
            _ = self.cancelled() => return Err(Cancelled),
            output = step => output,
        };
        if self.is_cancelled() {
            return Err(Cancelled);
        }
        Ok(output)
    }
}
