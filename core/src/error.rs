//! Error types and HTTP status mapping

use serde::Serialize;
use thiserror::Error;

/// Result type alias for verification operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Verification error with HTTP status code mapping
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request did not carry a structurally usable token
    #[error("invalid token: {message}")]
    JwtInvalid { message: String },

    /// The JWT library rejected the token (claims, expiry, format, signature)
    #[error("token verification failed: {message}")]
    JwtVerification { message: String },

    /// The signing key named by the token header is not published
    #[error("no matching key for kid '{kid}'")]
    JwksNoMatchingKey { kid: String },

    /// The token verified but failed an application claim requirement
    #[error("claim validation failed: {message}")]
    ClaimValidation { message: String },

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },

    #[error("upstream error: {message}")]
    Upstream { message: String },
}

impl ApiError {
    pub fn jwt_invalid(message: impl Into<String>) -> Self {
        Self::JwtInvalid {
            message: message.into(),
        }
    }

    pub fn jwt_verification(message: impl Into<String>) -> Self {
        Self::JwtVerification {
            message: message.into(),
        }
    }

    pub fn no_matching_key(kid: impl Into<String>) -> Self {
        Self::JwksNoMatchingKey { kid: kid.into() }
    }

    pub fn claim_validation(message: impl Into<String>) -> Self {
        Self::ClaimValidation {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    /// Whether this error describes a rejected token rather than a service fault
    pub fn is_jwt_error(&self) -> bool {
        matches!(
            self,
            Self::JwtInvalid { .. }
                | Self::JwtVerification { .. }
                | Self::JwksNoMatchingKey { .. }
                | Self::ClaimValidation { .. }
        )
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::JwtInvalid { .. } => 401,
            Self::JwtVerification { .. } => 401,
            Self::JwksNoMatchingKey { .. } => 401,
            Self::ClaimValidation { .. } => 403,
            Self::Configuration { .. } => 500,
            Self::Internal { .. } => 500,
            Self::Upstream { .. } => 502,
        }
    }

    /// Get the error key for this error
    pub fn error_key(&self) -> &'static str {
        match self {
            Self::JwtInvalid { .. } => "jwt_invalid",
            Self::JwtVerification { .. } => "jwt_verification_failed",
            Self::JwksNoMatchingKey { .. } => "jwks_no_matching_key",
            Self::ClaimValidation { .. } => "claim_validation_failed",
            Self::Configuration { .. } => "configuration_error",
            Self::Internal { .. } => "internal_error",
            Self::Upstream { .. } => "upstream_error",
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        Self {
            error: err.error_key().to_string(),
            message: err.to_string(),
        }
    }
}
