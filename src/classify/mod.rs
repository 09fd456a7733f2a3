//! Protocol error classification
//!
//! Turns the status and raw body of a failed request into one of four
//! outcomes: refresh credentials and retry, ignore, a reportable failure
//! carrying status/reason/message, or a fatal abort.

use serde_json::{Map, Value};
use tracing::warn;

pub mod reason;

pub use reason::{ErrorReason, DEFAULT_RETRY_REASONS};

/// Exit code for a response body that is neither JSON nor a known plain-text error
pub const EXIT_UNPARSEABLE_ERROR: i32 = 5;

/// Exit code for a JSON body without a recognizable error shape
pub const EXIT_MALFORMED_ERROR: i32 = 4;

/// Switches that influence classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyFlags {
    /// Caller accepts a nil result instead of an abort
    pub soft_errors: bool,
    /// Suppress the warning logged for ignored errors
    pub silent_errors: bool,
    /// The failure happened on one of the first attempts of a call
    pub early_attempt: bool,
}

/// Status, reason and message extracted from an error body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    /// HTTP status
    pub status: u16,
    /// Raw reason string as sent by the service
    pub reason: String,
    /// Human-readable message
    pub message: String,
}

impl ErrorDetail {
    fn new(status: u16, reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            message: message.into(),
        }
    }

    /// Parsed reason
    pub fn error_reason(&self) -> ErrorReason {
        ErrorReason::parse(&self.reason)
    }
}

/// Outcome of classifying a protocol error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Transient: refresh credentials and retry silently
    RefreshAndRetry,
    /// Proceed as if no error occurred
    Ignore,
    /// Genuine failure to report, retry, or re-raise
    Failure(ErrorDetail),
    /// Unrecoverable; abort with the given exit code
    Fatal {
        /// Process exit code
        code: i32,
        /// Explanation shown to the operator
        message: String,
    },
}

impl Classification {
    /// Legacy numeric form: -1 refresh, 0 ignore, otherwise the status or exit code
    pub fn status_code(&self) -> i32 {
        match self {
            Self::RefreshAndRetry => -1,
            Self::Ignore => 0,
            Self::Failure(detail) => i32::from(detail.status),
            Self::Fatal { code, .. } => *code,
        }
    }
}

/// Classify a failed request from its HTTP status and raw body
pub fn classify(status: u16, body: &str, flags: ClassifyFlags) -> Classification {
    let error = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map,
        _ => return classify_plain_text(status, body, flags),
    };

    match error.get("error") {
        Some(Value::Object(inner)) => classify_error_object(status, inner),
        _ => match error.get("error_description").and_then(Value::as_str) {
            Some("Invalid Value") => Classification::Failure(ErrorDetail::new(
                400,
                ErrorReason::Invalid.as_str(),
                "Invalid Value",
            )),
            _ => Classification::Fatal {
                code: EXIT_MALFORMED_ERROR,
                message: Value::Object(error).to_string(),
            },
        },
    }
}

fn classify_plain_text(status: u16, content: &str, flags: ClassifyFlags) -> Classification {
    let failure = |reason: ErrorReason, message: &str| {
        Classification::Failure(ErrorDetail::new(status, reason.as_str(), message))
    };

    match status {
        503 if content == "Quota exceeded for the current request" => {
            failure(ErrorReason::QuotaExceeded, content)
        }
        403 if content.starts_with("Request rate higher than configured") => {
            failure(ErrorReason::QuotaExceeded, content)
        }
        502 if content.contains("Bad Gateway") => failure(ErrorReason::BadGateway, content),
        504 if content.contains("Gateway Timeout") => failure(ErrorReason::GatewayTimeout, content),
        403 if content.contains("Invalid domain.") => failure(ErrorReason::NotFound, "Domain not found"),
        400 if content.contains("InvalidSsoSigningKey") => {
            failure(ErrorReason::Invalid, "InvalidSsoSigningKey")
        }
        401 if content.trim().is_empty() => Classification::RefreshAndRetry,
        _ if flags.early_attempt => Classification::RefreshAndRetry,
        _ if flags.soft_errors => {
            if !flags.silent_errors {
                warn!("{}", content);
            }
            Classification::Ignore
        }
        _ => Classification::Fatal {
            code: EXIT_UNPARSEABLE_ERROR,
            message: content.to_string(),
        },
    }
}

fn classify_error_object(status: u16, error: &Map<String, Value>) -> Classification {
    let status = error
        .get("code")
        .and_then(Value::as_u64)
        .and_then(|code| u16::try_from(code).ok())
        .unwrap_or(status);

    let first = error
        .get("errors")
        .and_then(|errors| errors.get(0))
        .and_then(Value::as_object);

    let message = first
        .and_then(|e| e.get("message"))
        .or_else(|| error.get("message"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let mut reason = first
        .and_then(|e| e.get("reason"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            error
                .get("status")
                .and_then(Value::as_str)
                .and_then(ErrorReason::from_rpc_status)
                .map(|r| r.as_str().to_string())
        })
        .unwrap_or_else(|| status.to_string());

    if status == 404
        && (message.contains("Requested entity was not found") || message.contains("does not exist"))
    {
        reason = ErrorReason::NotFound.as_str().to_string();
    }

    if status == 401 && ErrorReason::parse(&reason) == ErrorReason::AuthError {
        return Classification::RefreshAndRetry;
    }

    Classification::Failure(ErrorDetail::new(status, reason, message))
}
