//! The host seam for non-blocking iteration: a clock to measure the time
//! budget against, and a way to hand control back to the event loop.

use async_trait::async_trait;
use std::time::{Duration, Instant};

use crate::config::DEFAULT_YIELD_DELAY;

#[async_trait(?Send)]
pub trait EventLoop {
    /// Wall-clock reading used to measure the per-turn time budget.
    fn now(&self) -> Instant;

    /// Resolves on a later turn of the event loop.
    async fn defer(&self);
}

/// Defers through the tokio timer, like a zero-ish `setTimeout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokioLoop {
    yield_delay: Duration,
}

impl TokioLoop {
    pub const fn new(yield_delay: Duration) -> Self {
        Self { yield_delay }
    }

    pub fn yield_delay(&self) -> Duration {
        self.yield_delay
    }
}

impl Default for TokioLoop {
    fn default() -> Self {
        Self::new(DEFAULT_YIELD_DELAY)
    }
}

#[async_trait(?Send)]
impl EventLoop for TokioLoop {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn defer(&self) {
        if self.yield_delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.yield_delay).await;
        }
    }
}
