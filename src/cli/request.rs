//! Arguments shared by every operation command

use clap::Args;
use serde_json::Value;

use crate::classify::ErrorReason;
use crate::executor::CallPolicy;
use crate::service::{OperationRequest, Params};

use super::session::parse_key_value;
use super::CliError;

/// Operation name, parameters and error policy
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Operation to invoke (e.g. users.list)
    pub operation: String,

    /// Request parameter (repeatable)
    #[arg(long = "param", value_parser = parse_key_value)]
    pub params: Vec<(String, Value)>,

    /// JSON request body
    #[arg(long)]
    pub body: Option<String>,

    /// Warn and continue instead of aborting on unhandled errors
    #[arg(long, default_value_t = false)]
    pub soft_errors: bool,

    /// Do not warn about ignored errors
    #[arg(long, default_value_t = false)]
    pub silent_errors: bool,

    /// Error reason to report instead of handling (repeatable)
    #[arg(long = "throw-reason")]
    pub throw_reasons: Vec<ErrorReason>,

    /// Additional error reason to retry with backoff (repeatable)
    #[arg(long = "retry-reason")]
    pub retry_reasons: Vec<ErrorReason>,
}

impl RequestArgs {
    /// Build the operation request
    pub fn request(&self) -> Result<OperationRequest, CliError> {
        let params: Params = self.params.iter().cloned().collect();
        let request = OperationRequest::new(&self.operation, params);

        match &self.body {
            None => Ok(request),
            Some(text) => match serde_json::from_str(text)? {
                Value::Object(body) => Ok(request.with_body(body)),
                _ => Err(CliError::InvalidArgument(
                    "--body must be a JSON object".to_string(),
                )),
            },
        }
    }

    /// Error policy for the operation
    pub fn policy(&self) -> CallPolicy {
        let mut policy = CallPolicy::new()
            .throw_on(self.throw_reasons.iter().copied())
            .retry_on(self.retry_reasons.iter().copied());
        policy.soft_errors = self.soft_errors;
        policy.silent_errors = self.silent_errors;
        policy
    }
}
