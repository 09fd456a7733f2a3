//! Service handle abstraction consumed by the call executor and page aggregator
//!
//! A [`ServiceHandle`] is an authenticated connection to one remote API surface.
//! The core never constructs one; it only invokes operations on it and, during
//! error recovery, refreshes its credentials, clears its response cache, or
//! resets its connection pool.

use async_trait::async_trait;
use serde_json::{Map, Value};

pub mod discovery;
pub mod http;

pub use discovery::{DiscoveryDocument, MethodDesc, ParameterDesc, ResourceDesc};
pub use http::{EnvTokenSource, HttpService, StaticTokenSource, TokenSource};

/// Named request parameters. Keys are unique; a nested `body` object carries the
/// request payload.
pub type Params = Map<String, Value>;

/// Name of the parameter that holds the request payload.
pub const BODY_PARAM: &str = "body";

/// Raw failures produced by a [`ServiceHandle`]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// Protocol-level error carrying the HTTP status and the raw error body
    #[error("HTTP {status}: {body}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Credential refresh failed
    #[error("credential refresh failed: {0}")]
    Refresh(String),

    /// A value could not be decoded (typically a corrupt cached response)
    #[error("malformed value: {0}")]
    MalformedValue(String),

    /// Server unreachable or another connection-level fault
    #[error("connection error: {0}")]
    Connection(String),

    /// Bad parameters or types supplied to the operation
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation name does not resolve on the handle
    #[error("unknown operation: {0}")]
    UnknownOperation(String),
}

/// Result type for service handle operations
pub type ServiceResult<T> = Result<T, TransportError>;

/// One logical operation: a method name plus its parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationRequest {
    /// Operation name resolvable on the handle (e.g. `users.list`)
    pub operation: String,
    /// Request parameters
    pub params: Params,
}

impl OperationRequest {
    /// Create a request with the given parameters
    pub fn new(operation: impl Into<String>, params: Params) -> Self {
        Self {
            operation: operation.into(),
            params,
        }
    }

    /// Create a request without parameters
    pub fn named(operation: impl Into<String>) -> Self {
        Self::new(operation, Params::new())
    }

    /// Add a parameter, replacing any previous value
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Set the nested request body
    pub fn with_body(mut self, body: Params) -> Self {
        self.params.insert(BODY_PARAM.to_string(), Value::Object(body));
        self
    }
}

/// Authenticated connection to one remote API surface
#[async_trait]
pub trait ServiceHandle: Send + Sync {
    /// Invoke `operation` with `params` and return the decoded response
    async fn execute(&self, operation: &str, params: &Params) -> ServiceResult<Value>;

    /// Resolve the method identifier `operation` would invoke, without sending it
    fn method_id(&self, operation: &str, params: &Params) -> ServiceResult<String>;

    /// Declared resource/method metadata of the service
    fn discovery(&self) -> &DiscoveryDocument;

    /// Obtain fresh credentials for subsequent requests
    async fn refresh_credentials(&self) -> ServiceResult<()>;

    /// Drop the response cache. Returns `true` if a cache was active.
    fn clear_cache(&self) -> bool;

    /// Discard pooled connections
    fn reset_connections(&self);
}
