//! Single-call execution with retries, backoff, and credential recovery
//!
//! [`CallExecutor::call`] performs one logical operation against a
//! [`ServiceHandle`]. Every failure is routed through the classifier and ends in
//! exactly one of these outcomes:
//!
//! - **Success**: the response, possibly after retries
//! - **Ignored / soft**: `Ok(None)`, with a warning for soft errors
//! - **Re-raised**: [`CallError::Thrown`] for reasons listed in the policy
//! - **Fatal**: [`CallError::Fatal`] carrying the exit code; only the outermost
//!   CLI layer turns it into a process exit
//!
//! The attempt budget is [`config::MAX_ATTEMPTS`]. Credential refreshes and
//! cache resets do not consume it.

use serde_json::Value;
use tracing::{debug, warn};

use crate::classify::{classify, Classification, ClassifyFlags, ErrorDetail, ErrorReason};
use crate::metrics::{self, CallMetrics};
use crate::service::{OperationRequest, Params, ServiceHandle, TransportError};

pub mod config;
pub mod retry_formatter;
pub mod token;

pub use config::{AuthContext, ExecutorConfig, MAX_ATTEMPTS};
pub use retry_formatter::RetryContext;

use config::{EARLY_ATTEMPT_LIMIT, RETRY_NOTICE_THRESHOLD};
use retry_formatter::{format_fatal, format_soft_failure};

/// Exit code for malformed values, connection faults and argument faults
pub const EXIT_CLIENT_FAULT: i32 = 4;

/// Error re-raised for a reason the caller listed in `throw_reasons`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{status}: {message} - {reason}")]
pub struct ApiError {
    /// Classified reason
    pub reason: ErrorReason,
    /// HTTP status
    pub status: u16,
    /// Message from the service
    pub message: String,
}

/// Dedicated error kinds for reasons callers commonly react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Entity does not exist
    NotFound,
    /// Group does not exist
    GroupNotFound,
    /// User does not exist
    UserNotFound,
    /// Member does not exist
    MemberNotFound,
    /// Member is not valid for the group
    InvalidMember,
    /// Entity already exists
    Duplicate,
    /// Request was malformed
    BadRequest,
    /// Request argument was rejected
    Invalid,
    /// Caller lacks permission
    Forbidden,
    /// Operation precondition failed
    FailedPrecondition,
    /// Service disabled for the account or domain
    ServiceNotAvailable,
    /// Credentials were rejected
    AuthError,
    /// Operation aborted by the service
    Aborted,
    /// Operation not implemented by the service
    NotImplemented,
    /// Domain is unknown or may not use the API
    Domain,
    /// Membership change would create a cycle
    CyclicMembership,
    /// No dedicated kind
    Generic,
}

impl ApiError {
    /// Dedicated kind for the reason, or [`ApiErrorKind::Generic`]
    pub fn kind(&self) -> ApiErrorKind {
        match self.reason {
            ErrorReason::NotFound | ErrorReason::ResourceNotFound => ApiErrorKind::NotFound,
            ErrorReason::GroupNotFound => ApiErrorKind::GroupNotFound,
            ErrorReason::UserNotFound => ApiErrorKind::UserNotFound,
            ErrorReason::MemberNotFound => ApiErrorKind::MemberNotFound,
            ErrorReason::InvalidMember => ApiErrorKind::InvalidMember,
            ErrorReason::Duplicate => ApiErrorKind::Duplicate,
            ErrorReason::BadRequest => ApiErrorKind::BadRequest,
            ErrorReason::Invalid | ErrorReason::InvalidArgument => ApiErrorKind::Invalid,
            ErrorReason::Forbidden | ErrorReason::PermissionDenied => ApiErrorKind::Forbidden,
            ErrorReason::FailedPrecondition | ErrorReason::ConditionNotMet => {
                ApiErrorKind::FailedPrecondition
            }
            ErrorReason::ServiceNotAvailable => ApiErrorKind::ServiceNotAvailable,
            ErrorReason::AuthError => ApiErrorKind::AuthError,
            ErrorReason::Aborted => ApiErrorKind::Aborted,
            ErrorReason::NotImplemented => ApiErrorKind::NotImplemented,
            ErrorReason::DomainNotFound | ErrorReason::DomainCannotUseApis => ApiErrorKind::Domain,
            ErrorReason::CyclicMembershipsNotAllowed => ApiErrorKind::CyclicMembership,
            _ => ApiErrorKind::Generic,
        }
    }
}

/// Call errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    /// Re-raised protocol error
    #[error("API error: {0}")]
    Thrown(#[from] ApiError),

    /// Credential refresh failed and the caller asked for service-not-available to be raised
    #[error("service not available: {0}")]
    ServiceNotAvailable(String),

    /// Unrecoverable; the top-level caller should exit with `code`
    #[error("{message}")]
    Fatal {
        /// Process exit code
        code: i32,
        /// Explanation shown to the operator
        message: String,
    },
}

impl CallError {
    /// Exit code for fatal errors
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Fatal { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether this is the abort sentinel
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. })
    }

    /// Fatal error for a transport fault raised outside the retry loop
    pub fn from_transport(err: TransportError) -> Self {
        let code = match &err {
            TransportError::Http { status, .. } => i32::from(*status),
            _ => EXIT_CLIENT_FAULT,
        };
        Self::Fatal {
            code,
            message: err.to_string(),
        }
    }
}

/// Result type for call execution
pub type CallResult<T> = Result<T, CallError>;

/// Per-call error handling policy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallPolicy {
    /// Reasons re-raised to the caller; takes precedence over retrying
    pub throw_reasons: Vec<ErrorReason>,
    /// Reasons retried with backoff, in addition to the default retry set
    pub retry_reasons: Vec<ErrorReason>,
    /// Log and swallow errors instead of aborting
    pub soft_errors: bool,
    /// Suppress the warning for ignored errors
    pub silent_errors: bool,
}

impl CallPolicy {
    /// Default policy: abort on unhandled errors
    pub fn new() -> Self {
        Self::default()
    }

    /// Log and swallow unhandled errors
    pub fn soft() -> Self {
        Self {
            soft_errors: true,
            ..Self::default()
        }
    }

    /// Re-raise these reasons
    pub fn throw_on(mut self, reasons: impl IntoIterator<Item = ErrorReason>) -> Self {
        self.throw_reasons.extend(reasons);
        self
    }

    /// Retry these reasons with backoff
    pub fn retry_on(mut self, reasons: impl IntoIterator<Item = ErrorReason>) -> Self {
        self.retry_reasons.extend(reasons);
        self
    }

    /// Suppress warnings for ignored errors
    pub fn silent(mut self) -> Self {
        self.silent_errors = true;
        self
    }

    /// Whether `reason` must be re-raised
    pub fn throws(&self, reason: ErrorReason) -> bool {
        reason.is_known() && self.throw_reasons.contains(&reason)
    }

    /// Whether `reason` is retry-eligible
    pub fn retries(&self, reason: ErrorReason) -> bool {
        reason.is_known() && (reason.is_default_retry() || self.retry_reasons.contains(&reason))
    }
}

/// Executes single operations with bounded retries
#[derive(Debug, Clone, Default)]
pub struct CallExecutor {
    config: ExecutorConfig,
}

impl CallExecutor {
    /// Executor with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Executor with the given session configuration
    pub fn with_config(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// Session configuration
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Request parameters merged with the session-wide extra parameters
    pub fn merged_params(&self, params: &Params) -> Params {
        let mut merged = params.clone();
        for (key, value) in &self.config.extra_params {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }

    /// Execute one logical call.
    ///
    /// Returns `Ok(None)` when the error was ignorable or soft.
    pub async fn call(
        &self,
        handle: &dyn ServiceHandle,
        request: &OperationRequest,
        policy: &CallPolicy,
    ) -> CallResult<Option<Value>> {
        let metrics = CallMetrics::start(request.operation.clone());
        let result = self.call_inner(handle, request, policy).await;
        let outcome = match &result {
            Ok(Some(_)) => "success",
            Ok(None) => "empty",
            Err(CallError::Fatal { .. }) => "fatal",
            Err(_) => "thrown",
        };
        metrics.record_outcome(outcome);
        result
    }

    async fn call_inner(
        &self,
        handle: &dyn ServiceHandle,
        request: &OperationRequest,
        policy: &CallPolicy,
    ) -> CallResult<Option<Value>> {
        let operation = request.operation.as_str();
        let params = self.merged_params(&request.params);

        let mut attempt: u32 = 1;
        let mut refreshes: u32 = 0;
        // Every execution, refreshed or not, closes the early window
        let mut passes: u32 = 0;

        loop {
            passes += 1;
            debug!(operation, attempt, passes, "Executing operation");

            let failure = match handle.execute(operation, &params).await {
                Ok(response) => {
                    if attempt > 1 {
                        let ctx = RetryContext::new(
                            attempt,
                            MAX_ATTEMPTS,
                            "",
                            self.config.backoff_for(attempt),
                            operation,
                        );
                        debug!("{}", ctx.format_success());
                    }
                    return Ok(Some(response));
                }
                Err(err) => err,
            };

            match failure {
                TransportError::Http { status, body } => {
                    let flags = ClassifyFlags {
                        soft_errors: policy.soft_errors,
                        silent_errors: policy.silent_errors,
                        early_attempt: passes < EARLY_ATTEMPT_LIMIT,
                    };

                    let detail = match classify(status, &body, flags) {
                        Classification::RefreshAndRetry if refreshes < MAX_ATTEMPTS => {
                            refreshes += 1;
                            metrics::record_credential_refresh();
                            debug!(operation, refreshes, "Refreshing credentials before retry");
                            if let Err(err) = handle.refresh_credentials().await {
                                return self.refresh_failed(err, policy);
                            }
                            continue;
                        }
                        Classification::RefreshAndRetry => ErrorDetail {
                            status,
                            reason: ErrorReason::AuthError.as_str().to_string(),
                            message: "Credentials still rejected after refresh".to_string(),
                        },
                        Classification::Ignore => return Ok(None),
                        Classification::Fatal { code, message } => {
                            return Err(CallError::Fatal { code, message });
                        }
                        Classification::Failure(detail) => detail,
                    };

                    let reason = detail.error_reason();
                    if policy.throws(reason) {
                        return Err(CallError::Thrown(ApiError {
                            reason,
                            status: detail.status,
                            message: detail.message,
                        }));
                    }

                    if attempt < MAX_ATTEMPTS && policy.retries(reason) {
                        self.back_off(attempt, &detail.reason, &detail.reason, operation).await;
                        attempt += 1;
                        continue;
                    }

                    if policy.soft_errors {
                        warn!(
                            "{}",
                            format_soft_failure(detail.status, &detail.message, &detail.reason, attempt > 1)
                        );
                        return Ok(None);
                    }

                    return Err(CallError::Fatal {
                        code: i32::from(detail.status),
                        message: format_fatal(detail.status, &detail.message, &detail.reason),
                    });
                }
                err @ TransportError::Refresh(_) => return self.refresh_failed(err, policy),
                TransportError::MalformedValue(message) => {
                    if handle.clear_cache() {
                        debug!(operation, "Cleared response cache after malformed value");
                        continue;
                    }
                    return Err(CallError::Fatal {
                        code: EXIT_CLIENT_FAULT,
                        message,
                    });
                }
                TransportError::Connection(message) => {
                    if attempt < MAX_ATTEMPTS {
                        handle.reset_connections();
                        self.back_off(attempt, &message, "connection", operation).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(CallError::Fatal {
                        code: EXIT_CLIENT_FAULT,
                        message,
                    });
                }
                err @ (TransportError::InvalidArgument(_) | TransportError::UnknownOperation(_)) => {
                    return Err(CallError::Fatal {
                        code: EXIT_CLIENT_FAULT,
                        message: err.to_string(),
                    });
                }
            }
        }
    }

    fn refresh_failed(&self, err: TransportError, policy: &CallPolicy) -> CallResult<Option<Value>> {
        let message = match err {
            TransportError::Refresh(message) => message,
            other => return Err(CallError::from_transport(other)),
        };

        let raise_unavailable = policy.throw_reasons.contains(&ErrorReason::ServiceNotAvailable);
        token::handle_token_error(&message, policy.soft_errors || raise_unavailable, &self.config.auth)?;

        if raise_unavailable {
            return Err(CallError::ServiceNotAvailable(message));
        }

        warn!(
            "User {}: {}",
            self.config.auth.current_user.as_deref().unwrap_or("unknown"),
            message
        );
        Ok(None)
    }

    async fn back_off(&self, attempt: u32, error: &str, label: &str, operation: &str) {
        let delay = self.config.backoff_for(attempt);
        let ctx = RetryContext::new(attempt, MAX_ATTEMPTS, error, delay, operation);
        if attempt > RETRY_NOTICE_THRESHOLD {
            warn!("{}", ctx.format_retry());
        } else {
            debug!("{}", ctx.format_retry());
        }
        metrics::record_retry_backoff(delay, label);
        tokio::time::sleep(delay).await;
    }
}
