//! Exponential-backoff retry for transient ERP overload failures.
//!
//! The ERP back-ends intermittently reject bursts with overload responses.
//! Those calls almost always succeed when repeated after a short pause, so
//! the wrapper retries them with a growing delay. Every other failure kind
//! is presumed non-transient (bad request, authentication, ERP fault) and
//! propagates on the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::error::ErpError;
use crate::resilience::RateLimiter;

/// Per-call-sequence backoff state.
///
/// The delay grows by the configured multiplier after each consecutive
/// failure, never exceeds the ceiling, and resets only on success or when a
/// fresh sequence constructs a new value.
#[derive(Debug)]
pub struct Backoff {
    current: Duration,
    initial: Duration,
    max: Duration,
    multiplier: f64,
}

impl Backoff {
    /// Creates backoff state for one call sequence.
    #[must_use]
    pub fn new(config: &RetryConfig) -> Self {
        let initial = config.initial_delay();
        Self {
            current: initial,
            initial,
            max: config.max_delay(),
            multiplier: config.multiplier,
        }
    }

    /// Returns the delay to wait before the next attempt and advances the
    /// state: `delay(k+1) = min(delay(k) × multiplier, max)`.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        // Computed in f64 so a pathological multiplier saturates at the
        // ceiling instead of overflowing Duration.
        let grown = self.current.as_secs_f64() * self.multiplier;
        self.current = Duration::from_secs_f64(grown.min(self.max.as_secs_f64()));
        delay
    }

    /// Resets the delay to its initial value after a successful call.
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

/// Dispatches `call` through the rate limiter, retrying transient overload
/// failures with exponential backoff.
///
/// Each attempt goes through admission again, so retries also respect the
/// request ceiling and minimum spacing. Only [`ErpError::Overloaded`] is
/// retried; after `max_retries` retries the terminal overload error is
/// returned. Any other error returns immediately.
///
/// Dropping the returned future during an admission or backoff wait aborts
/// the sequence: no retry runs and no dispatch is recorded for the aborted
/// attempt.
///
/// # Errors
///
/// Returns the first non-overload error, or the final overload error once
/// the retry budget is spent.
pub async fn call_with_retry<T, F, Fut>(
    limiter: &RateLimiter,
    config: &RetryConfig,
    mut call: F,
) -> Result<T, ErpError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ErpError>>,
{
    let mut backoff = Backoff::new(config);
    let mut attempt: u32 = 0;

    loop {
        limiter.acquire().await;

        match call().await {
            Ok(value) => {
                backoff.reset();
                return Ok(value);
            }
            Err(err) if err.is_overloaded() && attempt < config.max_retries => {
                attempt += 1;
                let delay = backoff.next_delay();
                tracing::warn!(
                    attempt,
                    max_retries = config.max_retries,
                    wait_s = delay.as_secs_f64(),
                    "ERP overloaded, backing off before retry"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => {
                if err.is_overloaded() {
                    tracing::error!(
                        attempts = attempt + 1,
                        "retry budget exhausted for overloaded ERP"
                    );
                }
                return Err(err);
            }
        }
    }
}
