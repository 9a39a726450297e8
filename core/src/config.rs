//! Configuration loaded from the platform environment

use crate::error::{ApiError, Result};
use crate::platform::{CacheHint, Environment, StatusRange};

/// Google's published signing certificates for Firebase ID tokens (kid -> PEM)
pub const CERTIFICATES_URL: &str =
    "https://www.googleapis.com/robot/v1/metadata/x509/securetoken@system.gserviceaccount.com";

/// Issuer prefix; the Firebase project id is appended
pub const ISSUER_PREFIX: &str = "https://securetoken.google.com/";

/// Edge cache rules for the certificate document
pub const CERTIFICATES_CACHE: CacheHint = CacheHint {
    cache_everything: true,
    ttl_by_status: &[
        (StatusRange::new(200, 299), 18473),
        (StatusRange::single(404), 1),
        (StatusRange::new(500, 599), 0),
    ],
};

/// Allowed clock skew for `iat` and `auth_time` (seconds)
pub const CLOCK_SKEW_SECS: u64 = 60;

pub const USER_AGENT: &str = "firebase-jwt-rust";

/// Application configuration loaded from environment
#[derive(Debug, Clone)]
pub struct Config {
    /// Firebase project id, used as audience and issuer suffix
    pub project_id: String,
    /// Reject tokens whose `email_verified` claim is not true
    pub require_email_verified: bool,
    /// Accepted `firebase.sign_in_provider` values (empty accepts any)
    pub allowed_sign_in_providers: Vec<String>,
}

impl Config {
    /// Load configuration from platform environment
    pub fn from_env(env: &dyn Environment) -> Result<Self> {
        let project_id = env
            .get_var("FIREBASE_PROJECT_ID")
            .map_err(|_| ApiError::configuration("FIREBASE_PROJECT_ID not configured"))?;

        let require_email_verified = match env.get_var("FIREBASE_REQUIRE_EMAIL_VERIFIED") {
            Ok(value) => parse_bool(&value).ok_or_else(|| {
                ApiError::configuration(format!(
                    "FIREBASE_REQUIRE_EMAIL_VERIFIED must be true or false, got '{}'",
                    value
                ))
            })?,
            Err(_) => false,
        };

        let allowed_sign_in_providers = env
            .get_var("FIREBASE_ALLOWED_PROVIDERS")
            .map(|value| parse_list(&value))
            .unwrap_or_default();

        Ok(Self {
            project_id: project_id.trim().to_string(),
            require_email_verified,
            allowed_sign_in_providers,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" => Some(false),
        "1" | "true" | "yes" => Some(true),
        _ => None,
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
