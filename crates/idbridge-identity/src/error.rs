//! Error types for the identity client.

use thiserror::Error;

/// Errors from the identity service client.
///
/// Every variant except `InvalidConfig` is scoped to a single resolution
/// attempt; the consumer loop absorbs them and moves to the next event.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Client construction rejected its configuration.
    #[error("Identity client configuration invalid: {0}")]
    InvalidConfig(String),

    /// The client-credentials token exchange failed.
    #[error("Token exchange failed: {0}")]
    Auth(String),

    /// The identity service answered the profile fetch with a non-success
    /// status other than 404.
    #[error("Identity service returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// The profile fetch did not complete (connect failure, timeout).
    #[error("Request to identity service failed: {0}")]
    Request(String),

    /// The profile response body was not valid JSON for a user profile.
    #[error("Identity service response could not be decoded: {0}")]
    InvalidResponse(String),
}

/// Result alias for identity client operations.
pub type IdentityResult<T> = Result<T, IdentityError>;
