//! Sliding-window rate limiter for outbound ERP calls.
//!
//! The ERP APIs throttle aggressively, so the server bounds itself to a
//! configured number of requests per trailing minute and keeps a minimum
//! gap between consecutive dispatches.
//!
//! # Concurrency
//!
//! One limiter instance is shared by every call sequence targeting the same
//! platform. The prune–check–record sequence runs as a single critical
//! section behind a [`tokio::sync::Mutex`]; waits happen with the lock
//! released and loop back to re-check, so a concurrent caller can never
//! observe a stale window between another caller's prune and record.
//!
//! # Cancellation
//!
//! A dispatch instant is recorded only when admission succeeds. Dropping
//! the future mid-wait leaves the window untouched.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::RateLimitConfig;

/// The trailing window over which the request ceiling applies.
const WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct Budget {
    /// Dispatch instants within the trailing window, oldest first.
    timestamps: VecDeque<Instant>,
    /// Instant of the most recent dispatch.
    last_dispatch: Option<Instant>,
}

impl Budget {
    /// Drops timestamps that have left the trailing window.
    fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.timestamps.front() {
            if now.duration_since(oldest) >= WINDOW {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Time until the oldest timestamp leaves the window, if the ceiling
    /// has been reached.
    fn ceiling_wait(&self, now: Instant, ceiling: usize) -> Option<Duration> {
        if self.timestamps.len() < ceiling {
            return None;
        }
        self.timestamps
            .front()
            .map(|&oldest| WINDOW.saturating_sub(now.duration_since(oldest)))
    }

    /// Remaining minimum-spacing wait since the last dispatch, if any.
    fn spacing_wait(&self, now: Instant, min_delay: Duration) -> Option<Duration> {
        let last = self.last_dispatch?;
        let since = now.duration_since(last);
        (since < min_delay).then(|| min_delay - since)
    }

    /// Records a dispatch at `now`.
    fn record(&mut self, now: Instant) {
        self.timestamps.push_back(now);
        self.last_dispatch = Some(now);
    }
}

/// Admission control for outbound ERP calls.
///
/// Enforces a requests-per-minute ceiling over a trailing 60-second window
/// plus a minimum spacing between consecutive dispatches. Waits are
/// `tokio::time::sleep`s, so other tasks keep running while a caller is
/// suspended.
#[derive(Debug)]
pub struct RateLimiter {
    ceiling: usize,
    min_delay: Duration,
    budget: Mutex<Budget>,
}

impl RateLimiter {
    /// Creates a limiter from the configured ceiling and spacing.
    #[must_use]
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            ceiling: config.requests_per_minute as usize,
            min_delay: config.min_delay(),
            budget: Mutex::new(Budget {
                timestamps: VecDeque::new(),
                last_dispatch: None,
            }),
        }
    }

    /// Waits until the budget admits one more request, then records its
    /// dispatch instant.
    ///
    /// The recorded instant counts against the window for subsequent
    /// callers, so the caller should dispatch promptly after admission.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut budget = self.budget.lock().await;
                let now = Instant::now();

                budget.prune(now);

                if let Some(wait) = budget.ceiling_wait(now, self.ceiling) {
                    tracing::info!(
                        wait_s = wait.as_secs_f64(),
                        "request ceiling reached, waiting for window"
                    );
                    wait
                } else if let Some(wait) = budget.spacing_wait(now, self.min_delay) {
                    tracing::debug!(wait_s = wait.as_secs_f64(), "enforcing minimum spacing");
                    wait
                } else {
                    budget.record(now);
                    return;
                }
            };

            tokio::time::sleep(wait).await;
        }
    }

    /// Number of dispatches currently inside the trailing window.
    ///
    /// Prunes expired entries first, so the answer reflects the window as
    /// an admission decision would see it.
    pub async fn in_flight_window(&self) -> usize {
        let mut budget = self.budget.lock().await;
        budget.prune(Instant::now());
        budget.timestamps.len()
    }
}
