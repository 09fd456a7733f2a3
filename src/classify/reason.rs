//! Protocol error reasons

use std::fmt;

/// Closed set of protocol-level error reasons.
///
/// Unrecognized reason strings parse to [`ErrorReason::Unknown`], which is never
/// retried or re-raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorReason {
    /// "aborted"
    Aborted,
    /// "authError" (invalid credentials)
    AuthError,
    /// "backendError"
    BackendError,
    /// "badGateway"
    BadGateway,
    /// "badRequest"
    BadRequest,
    /// "conditionNotMet"
    ConditionNotMet,
    /// "cyclicMembershipsNotAllowed"
    CyclicMembershipsNotAllowed,
    /// "domainCannotUseApis"
    DomainCannotUseApis,
    /// "domainNotFound"
    DomainNotFound,
    /// "duplicate"
    Duplicate,
    /// "failedPrecondition"
    FailedPrecondition,
    /// "forbidden"
    Forbidden,
    /// "409"
    Conflict,
    /// "403"
    Status403,
    /// "429"
    TooManyRequests,
    /// "gatewayTimeout"
    GatewayTimeout,
    /// "groupNotFound"
    GroupNotFound,
    /// "internalError"
    InternalError,
    /// "invalid"
    Invalid,
    /// "invalidArgument"
    InvalidArgument,
    /// "invalidMember"
    InvalidMember,
    /// "memberNotFound"
    MemberNotFound,
    /// "notFound"
    NotFound,
    /// "notImplemented"
    NotImplemented,
    /// "permissionDenied"
    PermissionDenied,
    /// "quotaExceeded"
    QuotaExceeded,
    /// "rateLimitExceeded"
    RateLimitExceeded,
    /// "resourceNotFound"
    ResourceNotFound,
    /// "serviceLimit"
    ServiceLimit,
    /// "serviceNotAvailable"
    ServiceNotAvailable,
    /// "systemError"
    SystemError,
    /// "userNotFound"
    UserNotFound,
    /// "userRateLimitExceeded"
    UserRateLimitExceeded,
    /// Anything else
    Unknown,
}

/// Reasons retried with backoff on every call, in addition to the caller's list
pub const DEFAULT_RETRY_REASONS: &[ErrorReason] = &[
    ErrorReason::QuotaExceeded,
    ErrorReason::RateLimitExceeded,
    ErrorReason::UserRateLimitExceeded,
    ErrorReason::BackendError,
    ErrorReason::BadGateway,
    ErrorReason::GatewayTimeout,
    ErrorReason::InternalError,
    ErrorReason::TooManyRequests,
];

const ALL: &[ErrorReason] = &[
    ErrorReason::Aborted,
    ErrorReason::AuthError,
    ErrorReason::BackendError,
    ErrorReason::BadGateway,
    ErrorReason::BadRequest,
    ErrorReason::ConditionNotMet,
    ErrorReason::CyclicMembershipsNotAllowed,
    ErrorReason::DomainCannotUseApis,
    ErrorReason::DomainNotFound,
    ErrorReason::Duplicate,
    ErrorReason::FailedPrecondition,
    ErrorReason::Forbidden,
    ErrorReason::Conflict,
    ErrorReason::Status403,
    ErrorReason::TooManyRequests,
    ErrorReason::GatewayTimeout,
    ErrorReason::GroupNotFound,
    ErrorReason::InternalError,
    ErrorReason::Invalid,
    ErrorReason::InvalidArgument,
    ErrorReason::InvalidMember,
    ErrorReason::MemberNotFound,
    ErrorReason::NotFound,
    ErrorReason::NotImplemented,
    ErrorReason::PermissionDenied,
    ErrorReason::QuotaExceeded,
    ErrorReason::RateLimitExceeded,
    ErrorReason::ResourceNotFound,
    ErrorReason::ServiceLimit,
    ErrorReason::ServiceNotAvailable,
    ErrorReason::SystemError,
    ErrorReason::UserNotFound,
    ErrorReason::UserRateLimitExceeded,
];

impl ErrorReason {
    /// Wire representation of the reason
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aborted => "aborted",
            Self::AuthError => "authError",
            Self::BackendError => "backendError",
            Self::BadGateway => "badGateway",
            Self::BadRequest => "badRequest",
            Self::ConditionNotMet => "conditionNotMet",
            Self::CyclicMembershipsNotAllowed => "cyclicMembershipsNotAllowed",
            Self::DomainCannotUseApis => "domainCannotUseApis",
            Self::DomainNotFound => "domainNotFound",
            Self::Duplicate => "duplicate",
            Self::FailedPrecondition => "failedPrecondition",
            Self::Forbidden => "forbidden",
            Self::Conflict => "409",
            Self::Status403 => "403",
            Self::TooManyRequests => "429",
            Self::GatewayTimeout => "gatewayTimeout",
            Self::GroupNotFound => "groupNotFound",
            Self::InternalError => "internalError",
            Self::Invalid => "invalid",
            Self::InvalidArgument => "invalidArgument",
            Self::InvalidMember => "invalidMember",
            Self::MemberNotFound => "memberNotFound",
            Self::NotFound => "notFound",
            Self::NotImplemented => "notImplemented",
            Self::PermissionDenied => "permissionDenied",
            Self::QuotaExceeded => "quotaExceeded",
            Self::RateLimitExceeded => "rateLimitExceeded",
            Self::ResourceNotFound => "resourceNotFound",
            Self::ServiceLimit => "serviceLimit",
            Self::ServiceNotAvailable => "serviceNotAvailable",
            Self::SystemError => "systemError",
            Self::UserNotFound => "userNotFound",
            Self::UserRateLimitExceeded => "userRateLimitExceeded",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a wire reason; unrecognized strings map to [`ErrorReason::Unknown`]
    pub fn parse(raw: &str) -> Self {
        ALL.iter()
            .copied()
            .find(|reason| reason.as_str() == raw)
            .unwrap_or(Self::Unknown)
    }

    /// Map a canonical RPC status name (e.g. `PERMISSION_DENIED`) to a reason
    pub fn from_rpc_status(status: &str) -> Option<Self> {
        let reason = match status {
            "ABORTED" => Self::Aborted,
            "ALREADY_EXISTS" => Self::Duplicate,
            "FAILED_PRECONDITION" => Self::FailedPrecondition,
            "INTERNAL" => Self::InternalError,
            "INVALID_ARGUMENT" => Self::InvalidArgument,
            "NOT_FOUND" => Self::NotFound,
            "PERMISSION_DENIED" => Self::PermissionDenied,
            "RESOURCE_EXHAUSTED" => Self::RateLimitExceeded,
            "UNAUTHENTICATED" => Self::AuthError,
            "UNAVAILABLE" => Self::BackendError,
            "UNIMPLEMENTED" => Self::NotImplemented,
            _ => return None,
        };
        Some(reason)
    }

    /// Whether the reason belongs to the closed set
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Whether the reason is always retried with backoff
    pub fn is_default_retry(&self) -> bool {
        DEFAULT_RETRY_REASONS.contains(self)
    }
}

impl fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ErrorReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::parse(s) {
            Self::Unknown => Err(format!("unknown error reason: {s}")),
            reason => Ok(reason),
        }
    }
}
