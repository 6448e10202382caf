//! Cancellable waiting: the [`Scheduler`] seam for backoff delays and the [`Liveness`]
//! token a consumer cancels on teardown.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

/// Source of backoff delays. Injected so tests can observe delays without waiting.
#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

/// Real timers via `tokio::time`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Liveness flag shared between a resolution and whoever consumes its result.
/// Once cancelled it stays cancelled; clones observe the same flag.
#[derive(Debug, Clone)]
pub struct Liveness {
    alive: Arc<watch::Sender<bool>>,
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

impl Liveness {
    pub fn new() -> Self {
        let (alive, _) = watch::channel(true);
        Self {
            alive: Arc::new(alive),
        }
    }

    pub fn is_alive(&self) -> bool {
        *self.alive.borrow()
    }

    pub fn cancel(&self) {
        self.alive.send_replace(false);
    }

    /// Completes once [`Liveness::cancel`] has been called on any clone.
    pub async fn cancelled(&self) {
        let mut rx = self.alive.subscribe();
        // The sender lives as long as `self`, so `wait_for` cannot observe a closed channel.
        let _ = rx.wait_for(|alive| !*alive).await;
    }
}
