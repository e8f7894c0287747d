//! Rate limiting and retry handling for outbound ERP calls.
//!
//! Every request to an ERP back-end flows through this module:
//!
//! 1. [`RateLimiter`] admits the request, enforcing a requests-per-minute
//!    ceiling over a trailing 60-second window and a minimum spacing
//!    between consecutive dispatches.
//! 2. The wrapped call is dispatched.
//! 3. [`call_with_retry`] absorbs transient overload failures with
//!    exponential backoff; any other failure propagates immediately.
//!
//! This is the single place where failures are classified as retryable or
//! fatal. Callers above it observe only "eventually succeeded" or
//! "terminally failed after the retry budget was spent".

mod limiter;
mod retry;

pub use limiter::RateLimiter;
pub use retry::{call_with_retry, Backoff};
