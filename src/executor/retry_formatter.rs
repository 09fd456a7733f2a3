//! Retry message formatting for the call executor.
//!
//! Keeps back-off notices and give-up summaries consistent across the
//! different failure paths (protocol errors and connection faults).

use std::time::Duration;

/// Context for formatting retry messages.
#[derive(Debug, Clone)]
pub struct RetryContext {
    /// Attempt that just failed (1-based)
    pub attempt: u32,
    /// Maximum number of attempts configured
    pub max_attempts: u32,
    /// Reason or fault description that triggered the retry
    pub error: String,
    /// Backoff duration until next attempt
    pub backoff_duration: Duration,
    /// Operation being invoked (e.g. "users.list")
    pub operation: String,
}

impl RetryContext {
    /// Convenience constructor used throughout the retry logic.
    pub fn new(
        attempt: u32,
        max_attempts: u32,
        error: impl Into<String>,
        backoff_duration: Duration,
        operation: impl Into<String>,
    ) -> Self {
        Self {
            attempt,
            max_attempts,
            error: error.into(),
            backoff_duration,
            operation: operation.into(),
        }
    }

    /// Standard back-off notice with attempt counters.
    pub fn format_retry(&self) -> String {
        let mut message = format!(
            "Temporary error: {}, Backing off: {} seconds, Retry: {}/{}",
            self.error,
            self.backoff_duration.as_secs(),
            self.attempt,
            self.max_attempts
        );
        append_operation(&mut message, &self.operation);
        message
    }

    /// Message logged when a retried call eventually succeeds.
    pub fn format_success(&self) -> String {
        let mut message = format!(
            "Retry attempt {}/{} succeeded",
            self.attempt, self.max_attempts
        );
        append_operation(&mut message, &self.operation);
        message
    }
}

/// Soft-error report for a call that is abandoned.
///
/// `giving_up` marks calls that had already been retried.
pub fn format_soft_failure(status: u16, message: &str, reason: &str, giving_up: bool) -> String {
    let suffix = if giving_up { ": Giving up." } else { "" };
    format!("{status}: {message} - {reason}{suffix}")
}

/// Message carried by a fatal protocol failure.
pub fn format_fatal(status: u16, message: &str, reason: &str) -> String {
    format!("{status}: {message} - {reason}")
}

fn append_operation(buffer: &mut String, operation: &str) {
    if !operation.is_empty() {
        buffer.push_str(" (");
        buffer.push_str(operation);
        buffer.push(')');
    }
}
