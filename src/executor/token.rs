//! Credential refresh failure handling

use tracing::error;

use super::config::AuthContext;
use super::{CallError, CallResult};

/// Exit code when API access has not been granted to the client
pub const EXIT_ACCESS_DENIED: i32 = 12;

/// Exit code for unrecognized authentication failures
pub const EXIT_AUTH_ERROR: i32 = 18;

/// Exit code when the service is not enabled for the impersonated user
pub const EXIT_SERVICE_NOT_APPLICABLE: i32 = 19;

/// Known refresh failure messages, compared after stripping periods
pub const OAUTH2_TOKEN_ERRORS: &[&str] = &[
    "access_denied",
    "access_denied: Requested client not authorized",
    "internal_failure: Backend Error",
    "internal_failure: None",
    "invalid_grant",
    "invalid_grant: Bad Request",
    "invalid_grant: Invalid email or User ID",
    "invalid_grant: Not a valid email",
    "invalid_grant: Invalid JWT: No valid verifier found for issuer",
    "invalid_grant: The account has been deleted",
    "invalid_request: Invalid impersonation prn email address",
    "invalid_request: Invalid impersonation &quot;sub&quot; field",
    "unauthorized_client: Client is unauthorized to retrieve access tokens using this method",
    "unauthorized_client: Client is unauthorized to retrieve access tokens using this method, or client not authorized for any of the scopes requested",
    "unauthorized_client: Unauthorized client or scope in request",
];

/// Whether `message` is a recognized refresh failure
pub fn is_known_token_error(message: &str) -> bool {
    let token_error = message.replace('.', "");
    OAUTH2_TOKEN_ERRORS.contains(&token_error.as_str()) || token_error.starts_with("Invalid response")
}

/// Decide what a failed credential refresh means for the current call.
///
/// Returns `Ok(())` only for recognized failures when `soft_errors` is set;
/// every other path yields [`CallError::Fatal`].
pub fn handle_token_error(message: &str, soft_errors: bool, auth: &AuthContext) -> CallResult<()> {
    if !is_known_token_error(message) {
        return Err(CallError::Fatal {
            code: EXIT_AUTH_ERROR,
            message: format!("Authentication Token Error - {message}"),
        });
    }

    if soft_errors {
        return Ok(());
    }

    match &auth.current_user {
        None => {
            let denied = format!(
                "API access denied. Make sure client id {} is authorized for the API scope(s): {}",
                auth.client_id,
                auth.scopes.join(",")
            );
            error!("{}", denied);
            Err(CallError::Fatal {
                code: EXIT_ACCESS_DENIED,
                message: format!(
                    "{denied}\n\nAPI access is granted by the domain administrator in the admin console under API client access."
                ),
            })
        }
        Some(user) => Err(CallError::Fatal {
            code: EXIT_SERVICE_NOT_APPLICABLE,
            message: format!(
                "Service not applicable for this address: {user}. Make sure the service is enabled for the user."
            ),
        }),
    }
}
