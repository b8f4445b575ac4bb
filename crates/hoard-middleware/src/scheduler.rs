//! Trailing-edge debounce between "an action qualified" and "save now".
//!
//! Signals go through a per-instance unbounded channel into a spawned task.
//! With a non-zero debounce every signal re-arms the timer and only the
//! last one in a quiet window fires. With a zero debounce every signal
//! fires on its own, still from the task and never from the dispatching
//! call stack.
//!
//! Each signal is tracked from the moment it is sent until it is either
//! superseded or its save cycle finishes, so callers can wait for the
//! pipeline to go quiet.

use std::sync::Arc;
use std::time::Duration;

use hoard_core::{HoardError, Result};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};

/// Count of signals not yet superseded or completed.
#[derive(Clone)]
pub struct Outstanding {
    tx: Arc<watch::Sender<usize>>,
}

impl Outstanding {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    fn begin(&self) {
        self.tx.send_modify(|n| *n += 1);
    }

    fn finish(&self) {
        self.tx.send_modify(|n| *n = n.saturating_sub(1));
    }

    pub fn count(&self) -> usize {
        *self.tx.borrow()
    }

    /// Token for a cycle started outside the debounce loop.
    #[cfg(test)]
    pub(crate) fn token(&self) -> CycleToken {
        self.begin();
        CycleToken {
            outstanding: self.clone(),
        }
    }

    /// Resolve once nothing is pending or in flight.
    pub async fn wait_idle(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

impl Default for Outstanding {
    fn default() -> Self {
        Self::new()
    }
}

/// Held by a fired save cycle. Dropping it marks the cycle done, including
/// when the cycle's task panics.
pub struct CycleToken {
    outstanding: Outstanding,
}

impl Drop for CycleToken {
    fn drop(&mut self) {
        self.outstanding.finish();
    }
}

/// Sender side of the debounced save signal.
pub struct SaveScheduler {
    tx: mpsc::UnboundedSender<()>,
    outstanding: Outstanding,
}

impl SaveScheduler {
    /// Start the debounce task on the current tokio runtime.
    ///
    /// `fire` runs on the task each time a window closes. It must not block:
    /// hand the save off to its own task.
    pub fn spawn<F>(debounce: Duration, outstanding: Outstanding, fire: F) -> Result<Self>
    where
        F: FnMut(CycleToken) + Send + 'static,
    {
        let handle = Handle::try_current().map_err(|_| HoardError::NoRuntime)?;
        let (tx, rx) = mpsc::unbounded_channel();
        handle.spawn(debounce_loop(rx, debounce, outstanding.clone(), fire));
        tracing::debug!(debounce_ms = debounce.as_millis() as u64, "Save scheduler started");
        Ok(Self { tx, outstanding })
    }

    /// Record a qualifying action. Never blocks.
    pub fn signal(&self) {
        self.outstanding.begin();
        if self.tx.send(()).is_err() {
            self.outstanding.finish();
        }
    }
}

async fn debounce_loop<F>(
    mut rx: mpsc::UnboundedReceiver<()>,
    debounce: Duration,
    outstanding: Outstanding,
    mut fire: F,
) where
    F: FnMut(CycleToken),
{
    while rx.recv().await.is_some() {
        if !debounce.is_zero() {
            loop {
                match tokio::time::timeout(debounce, rx.recv()).await {
                    // A newer signal replaces the pending one.
                    Ok(Some(())) => outstanding.finish(),
                    Ok(None) => {
                        outstanding.finish();
                        tracing::debug!("Save scheduler closed with a pending signal; dropped");
                        return;
                    }
                    Err(_) => break,
                }
            }
        }
        fire(CycleToken {
            outstanding: outstanding.clone(),
        });
    }
    tracing::debug!("Save scheduler stopped");
}
