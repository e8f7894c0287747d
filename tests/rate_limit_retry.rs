//! Integration tests for the rate-limited retry wrapper.
//!
//! All timing runs on Tokio's paused test clock, so window rollovers and
//! backoff waits are observed exactly, without wall-clock sleeps.

use std::cell::Cell;
use std::time::Duration;

use serde_json::json;
use tokio::time::Instant;

use unified_erp_mcp::config::{RateLimitConfig, RetryConfig};
use unified_erp_mcp::error::ErpError;
use unified_erp_mcp::resilience::{call_with_retry, RateLimiter};

fn limiter(requests_per_minute: u32, min_delay_secs: f64) -> RateLimiter {
    let config: RateLimitConfig = serde_json::from_value(json!({
        "requests_per_minute": requests_per_minute,
        "min_delay_secs": min_delay_secs,
    }))
    .unwrap();
    RateLimiter::new(&config)
}

fn retry_config(max_retries: u32) -> RetryConfig {
    serde_json::from_value(json!({
        "initial_delay_secs": 1.0,
        "max_delay_secs": 60.0,
        "multiplier": 2.0,
        "max_retries": max_retries,
    }))
    .unwrap()
}

// =============================================================================
// Admission Control
// =============================================================================

#[tokio::test(start_paused = true)]
async fn n_plus_one_calls_delay_until_window_frees() {
    let n = 4;
    let limiter = limiter(n, 0.0);

    let start = Instant::now();
    for _ in 0..n {
        limiter.acquire().await;
    }
    assert_eq!(start.elapsed(), Duration::ZERO);

    // The (N+1)th call waits until the oldest timestamp leaves the
    // trailing 60-second window.
    limiter.acquire().await;
    assert_eq!(start.elapsed(), Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn back_to_back_calls_keep_minimum_gap() {
    let limiter = limiter(100, 2.0);

    limiter.acquire().await;
    let first = Instant::now();
    limiter.acquire().await;
    let second = Instant::now();

    assert!(second.duration_since(first) >= Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn staggered_calls_only_wait_the_remainder() {
    let limiter = limiter(100, 2.0);

    limiter.acquire().await;
    tokio::time::advance(Duration::from_millis(1500)).await;

    let before = Instant::now();
    limiter.acquire().await;
    // Only the remaining 500ms of the 2s gap is enforced.
    assert_eq!(before.elapsed(), Duration::from_millis(500));
}

// =============================================================================
// Retry & Backoff
// =============================================================================

#[tokio::test(start_paused = true)]
async fn persistent_overload_exhausts_retries_with_exponential_waits() {
    let limiter = limiter(1000, 0.0);
    let config = retry_config(3);
    let attempts = Cell::new(0u32);

    let start = Instant::now();
    let result: Result<(), ErpError> = call_with_retry(&limiter, &config, || {
        attempts.set(attempts.get() + 1);
        async { Err(ErpError::Overloaded { status: Some(529) }) }
    })
    .await;

    let err = result.unwrap_err();
    assert!(err.is_overloaded());

    // One initial attempt plus exactly max_retries retries.
    assert_eq!(attempts.get(), 4);

    // Backoff before retry k+1 is initial × multiplier^k: 1s + 2s + 4s.
    assert_eq!(start.elapsed(), Duration::from_secs(7));
}

#[tokio::test(start_paused = true)]
async fn backoff_is_capped_at_the_ceiling() {
    let limiter = limiter(1000, 0.0);
    let config: RetryConfig = serde_json::from_value(json!({
        "initial_delay_secs": 1.0,
        "max_delay_secs": 2.0,
        "multiplier": 10.0,
        "max_retries": 3,
    }))
    .unwrap();

    let start = Instant::now();
    let result: Result<(), ErpError> = call_with_retry(&limiter, &config, || async {
        Err(ErpError::Overloaded { status: None })
    })
    .await;

    assert!(result.is_err());
    // 1s, then capped at 2s twice.
    assert_eq!(start.elapsed(), Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn non_overload_failure_propagates_immediately() {
    let limiter = limiter(1000, 0.0);
    let config = retry_config(3);
    let attempts = Cell::new(0u32);

    let start = Instant::now();
    let result: Result<(), ErpError> = call_with_retry(&limiter, &config, || {
        attempts.set(attempts.get() + 1);
        async {
            Err(ErpError::Api {
                status: 401,
                body: "Unauthorized".to_string(),
            })
        }
    })
    .await;

    assert!(matches!(result, Err(ErpError::Api { status: 401, .. })));
    assert_eq!(attempts.get(), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn overload_then_success_is_absorbed() {
    let limiter = limiter(1000, 0.0);
    let config = retry_config(3);
    let attempts = Cell::new(0u32);

    let result = call_with_retry(&limiter, &config, || {
        attempts.set(attempts.get() + 1);
        let attempt = attempts.get();
        async move {
            if attempt == 1 {
                Err(ErpError::Overloaded { status: Some(503) })
            } else {
                Ok(json!({"ok": true}))
            }
        }
    })
    .await;

    assert_eq!(result.unwrap(), json!({"ok": true}));
    assert_eq!(attempts.get(), 2);
}

#[tokio::test(start_paused = true)]
async fn retries_also_pass_through_admission() {
    // Ceiling of 1: the retry cannot dispatch until the first attempt's
    // timestamp leaves the window, even though backoff alone is 1s.
    let limiter = limiter(1, 0.0);
    let config = retry_config(1);
    let attempts = Cell::new(0u32);

    let start = Instant::now();
    let _: Result<(), ErpError> = call_with_retry(&limiter, &config, || {
        attempts.set(attempts.get() + 1);
        async { Err(ErpError::Overloaded { status: Some(429) }) }
    })
    .await;

    assert_eq!(attempts.get(), 2);
    assert!(start.elapsed() >= Duration::from_secs(60));
}
