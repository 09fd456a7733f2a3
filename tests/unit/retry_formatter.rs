//! Unit tests for retry message formatting and backoff

use paged_rpc::executor::config::{calculate_backoff, MAX_ATTEMPTS};
use paged_rpc::executor::retry_formatter::{format_fatal, format_soft_failure, RetryContext};
use paged_rpc::ExecutorConfig;
use std::time::Duration;

#[test]
fn test_retry_message_format() {
    let ctx = RetryContext::new(5, MAX_ATTEMPTS, "backendError", Duration::from_secs(32), "");
    assert_eq!(
        ctx.format_retry(),
        "Temporary error: backendError, Backing off: 32 seconds, Retry: 5/10"
    );
}

#[test]
fn test_soft_failure_messages() {
    assert_eq!(
        format_soft_failure(404, "Resource Not Found", "notFound", false),
        "404: Resource Not Found - notFound"
    );
    assert_eq!(
        format_soft_failure(503, "Backend Error", "backendError", true),
        "503: Backend Error - backendError: Giving up."
    );
    assert_eq!(format_fatal(400, "Bad", "invalid"), "400: Bad - invalid");
}

#[test]
fn test_backoff_is_monotonic_and_capped() {
    let initial = Duration::from_millis(1000);
    let max = Duration::from_millis(60_000);

    let mut previous = Duration::ZERO;
    for attempt in 1..=MAX_ATTEMPTS {
        let delay = calculate_backoff(attempt, initial, max);
        assert!(delay >= previous);
        assert!(delay <= max);
        previous = delay;
    }
    assert_eq!(calculate_backoff(MAX_ATTEMPTS, initial, max), max);
}

#[test]
fn test_zero_backoff_config() {
    let config = ExecutorConfig::default().with_backoff(Duration::ZERO, Duration::ZERO);
    assert_eq!(config.backoff_for(9), Duration::ZERO);
}
