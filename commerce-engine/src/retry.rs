//! Time-bounded retry with exponential backoff.

use crate::{EngineConfig, EngineError, EngineResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// How long, and how often, transient failures are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total time after the first attempt during which retries start.
    pub budget: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(budget: Duration, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            budget,
            initial_backoff,
            max_backoff,
        }
    }

    pub fn for_create(config: &EngineConfig) -> Self {
        Self::new(config.create_budget(), config.initial_backoff(), config.max_backoff())
    }

    pub fn for_update(config: &EngineConfig) -> Self {
        Self::new(config.update_budget(), config.initial_backoff(), config.max_backoff())
    }

    pub fn for_delete(config: &EngineConfig) -> Self {
        Self::new(config.delete_budget(), config.initial_backoff(), config.max_backoff())
    }

    /// Delay before retry number `attempt` (starting at 1).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
    }

    /// Runs `f` until it succeeds, fails terminally, the budget runs out or
    /// `cancel` fires.
    ///
    /// Both the call and every backoff sleep race the token. A cancelled
    /// operation returns [`EngineError::Cancelled`] and schedules nothing
    /// further. When the budget is exhausted the last transient error is
    /// returned.
    pub async fn run<F, Fut, T>(&self, operation: &str, cancel: &CancellationToken, mut f: F) -> EngineResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = EngineResult<T>>,
    {
        let deadline = Instant::now() + self.budget;
        let mut attempt: u32 = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(EngineError::Cancelled),
                result = f() => result,
            };

            let error = match result {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(operation, attempt = attempt + 1, "succeeded after retries");
                    }
                    return Ok(value);
                }
                Err(error) if error.is_transient() => error,
                Err(error) => return Err(error),
            };

            attempt += 1;
            let delay = self.delay_for(attempt);
            if Instant::now() + delay > deadline {
                warn!(operation, attempts = attempt, error = %error, "retry budget exhausted");
                return Err(error);
            }
            debug!(
                operation,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "retrying after transient error"
            );
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(EngineError::Cancelled),
                () = tokio::time::sleep(delay) => {}
            }
        }
    }
}
