//! Authorization failures.
//!
//! Every failure of the gate is one of these variants. Each carries
//! - a machine-readable `code()` (stable, used in logs)
//! - a human-readable description (`Display`, used as the response `message`)
//! - a status classification (`status()`)
//!
//! Descriptions never contain token material.
use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authorization header is expected.")]
    MissingAuthorizationHeader,
    #[error("Authorization header must be bearer token.")]
    MalformedAuthorizationHeader,
    #[error("Authorization header must start with \"Bearer\".")]
    UnsupportedAuthScheme,

    #[error("Unable to parse authentication token.")]
    InvalidTokenStructure,
    #[error("Token signing algorithm is not accepted.")]
    UnsupportedAlgorithm,
    #[error("Unable to find the appropriate key.")]
    UnknownSigningKey,
    #[error("Token signature is invalid.")]
    InvalidSignature,

    #[error("Token expired.")]
    TokenExpired,
    #[error("Incorrect claims. Please, check the issuer.")]
    InvalidIssuer,
    #[error("Incorrect claims. Please, check the audience.")]
    InvalidAudience,

    #[error("Permissions not included in JWT.")]
    PermissionsClaimMissing,
    #[error("Permission not found.")]
    InsufficientPermission,

    #[error("Signing keys are currently unavailable.")]
    KeySetUnavailable,
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingAuthorizationHeader => "authorization_header_missing",
            Self::MalformedAuthorizationHeader => "authorization_header_malformed",
            Self::UnsupportedAuthScheme => "unsupported_auth_scheme",
            Self::InvalidTokenStructure => "invalid_token",
            Self::UnsupportedAlgorithm => "unsupported_algorithm",
            Self::UnknownSigningKey => "unknown_signing_key",
            Self::InvalidSignature => "invalid_signature",
            Self::TokenExpired => "token_expired",
            Self::InvalidIssuer => "invalid_issuer",
            Self::InvalidAudience => "invalid_audience",
            Self::PermissionsClaimMissing => "permissions_missing",
            Self::InsufficientPermission => "insufficient_permission",
            Self::KeySetUnavailable => "key_set_unavailable",
        }
    }

    /// 401 for authentication failures, 403 for permission failures,
    /// 503 when the identity provider's keys cannot be obtained.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::PermissionsClaimMissing | Self::InsufficientPermission => StatusCode::FORBIDDEN,
            Self::KeySetUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// True when the token itself was accepted and only the permission check failed.
    pub fn is_authorization_failure(&self) -> bool {
        self.status() == StatusCode::FORBIDDEN
    }
}
