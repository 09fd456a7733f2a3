//! CLI error types and exit codes

use crate::executor::{CallError, EXIT_CLIENT_FAULT};
use crate::service::TransportError;

/// Exit code for CLI plumbing failures
pub const EXIT_GENERAL_FAILURE: i32 = 1;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Call failed
    #[error("{0}")]
    Call(#[from] CallError),

    /// Service could not be set up
    #[error("service error: {0}")]
    Service(#[from] TransportError),

    /// JSON argument or output failure
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Metrics exporter could not be started
    #[error("metrics error: {0}")]
    Metrics(String),
}

impl CliError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Call(CallError::Fatal { code, .. }) => *code,
            Self::Call(CallError::Thrown(err)) => i32::from(err.status),
            Self::Service(_) | Self::Json(_) | Self::InvalidArgument(_) => EXIT_CLIENT_FAULT,
            Self::Call(CallError::ServiceNotAvailable(_)) | Self::Metrics(_) => EXIT_GENERAL_FAILURE,
        }
    }
}
