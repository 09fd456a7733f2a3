//! Call execution configuration

use serde_json::Value;
use std::time::Duration;

use crate::service::Params;

/// Attempts per logical call before giving up.
/// Credential refreshes are counted against a separate budget of the same size.
pub const MAX_ATTEMPTS: u32 = 10;

/// Attempts below this number count as "early" for error classification.
pub const EARLY_ATTEMPT_LIMIT: u32 = 3;

/// Back-off notices are logged at warn level only after this many attempts.
pub const RETRY_NOTICE_THRESHOLD: u32 = 3;

/// Initial backoff delay in milliseconds. The first retry waits twice this.
pub const INITIAL_BACKOFF_MS: u64 = 1000;

/// Maximum backoff delay in milliseconds.
pub const MAX_BACKOFF_MS: u64 = 60_000;

/// Calculate exponential backoff delay for a 1-indexed attempt
pub fn calculate_backoff(attempt: u32, initial: Duration, max: Duration) -> Duration {
    let factor = 2u32.saturating_pow(attempt);
    initial.saturating_mul(factor).min(max)
}

/// Identity used when explaining credential failures
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    /// OAuth client id the credentials were issued to
    pub client_id: String,
    /// Scopes requested for the current API
    pub scopes: Vec<String>,
    /// User being impersonated, if any
    pub current_user: Option<String>,
}

/// Session-wide executor configuration
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Parameters merged into every call; they override per-call values
    pub extra_params: Params,
    /// Backoff base delay
    pub initial_backoff: Duration,
    /// Backoff cap
    pub max_backoff: Duration,
    /// Identity used in credential error messages
    pub auth: AuthContext,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            extra_params: Params::new(),
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_backoff: Duration::from_millis(MAX_BACKOFF_MS),
            auth: AuthContext::default(),
        }
    }
}

impl ExecutorConfig {
    /// Add a parameter merged into every call
    pub fn with_extra_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra_params.insert(key.into(), value.into());
        self
    }

    /// Override the backoff base delay and cap
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    /// Set the identity used in credential error messages
    pub fn with_auth(mut self, auth: AuthContext) -> Self {
        self.auth = auth;
        self
    }

    /// Delay before retrying after `attempt` failed
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self.initial_backoff, self.max_backoff)
    }
}
