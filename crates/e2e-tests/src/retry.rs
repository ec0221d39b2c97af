//! Exponential backoff for operations that may need time to become true.
//!
//! The backend does not make freshly exported metrics visible immediately, so
//! the poller wraps its query in a retry loop. Errors are classified up front
//! as [`RetryError::Transient`] (worth another attempt) or
//! [`RetryError::Permanent`] (abort now) rather than inspected after the fact.

use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::debug;

/// Delay schedule for [`retry`].
///
/// Defaults match the common library schedule the harness previously relied
/// on: 500ms initial delay growing 1.5x per attempt, capped at 60s per delay
/// and 15 minutes overall. `max_elapsed: None` retries without a deadline.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    pub initial_interval: Duration,
    pub multiplier: f64,
    pub max_interval: Duration,
    pub max_elapsed: Option<Duration>,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            multiplier: 1.5,
            max_interval: Duration::from_secs(60),
            max_elapsed: Some(Duration::from_secs(15 * 60)),
        }
    }
}

/// Outcome classification for a single attempt.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The condition may clear on its own. Retry after the next delay.
    Transient(E),
    /// Retrying cannot help. Surface the error immediately.
    Permanent(E),
}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Transient(e) | RetryError::Permanent(e) => e,
        }
    }
}

/// Run `operation` until it succeeds, fails permanently, or the policy's
/// elapsed ceiling is reached.
///
/// A permanent error short-circuits the loop. A transient error sleeps for
/// the current delay and tries again; once the next delay would pass
/// `max_elapsed`, the last transient error is returned instead.
pub async fn retry<T, E, F, Fut>(policy: &BackoffPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RetryError<E>>>,
{
    let start = Instant::now();
    let mut delay = policy.initial_interval;

    loop {
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(RetryError::Permanent(error)) => return Err(error),
            Err(RetryError::Transient(error)) => error,
        };

        if let Some(max_elapsed) = policy.max_elapsed {
            if start.elapsed() + delay > max_elapsed {
                return Err(error);
            }
        }

        debug!(delay_ms = delay.as_millis() as u64, "retrying after transient failure");
        sleep(delay).await;

        delay = delay.mul_f64(policy.multiplier).min(policy.max_interval);
    }
}
