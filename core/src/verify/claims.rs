//! Firebase ID token claims and application claim requirements

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::Config;
use crate::error::{ApiError, Result};

/// Firebase ID token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseClaims {
    /// Issuer (`https://securetoken.google.com/<project>`)
    pub iss: String,

    /// Subject (the Firebase uid)
    pub sub: String,

    /// Audience (can be string or array)
    #[serde(deserialize_with = "deserialize_audience")]
    pub aud: Vec<String>,

    /// Expiration time
    pub exp: u64,

    /// Issued at
    pub iat: u64,

    /// Not before (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<u64>,

    /// Time the user authenticated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_time: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,

    /// Sign-in details added by Firebase Auth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firebase: Option<FirebaseInfo>,

    /// Custom claims
    #[serde(flatten)]
    pub custom_claims: HashMap<String, serde_json::Value>,
}

/// The `firebase` claim
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FirebaseInfo {
    #[serde(default)]
    pub sign_in_provider: Option<String>,

    #[serde(default)]
    pub identities: HashMap<String, serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
}

impl FirebaseClaims {
    pub fn sign_in_provider(&self) -> Option<&str> {
        self.firebase
            .as_ref()
            .and_then(|f| f.sign_in_provider.as_deref())
    }
}

/// Deserialize audience as either string or array
fn deserialize_audience<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct AudienceVisitor;

    impl<'de> Visitor<'de> for AudienceVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("string or array of strings")
        }

        fn visit_str<E>(self, value: &str) -> std::result::Result<Vec<String>, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Vec<String>, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut values = Vec::new();
            while let Some(value) = seq.next_element()? {
                values.push(value);
            }
            Ok(values)
        }
    }

    deserializer.deserialize_any(AudienceVisitor)
}

/// Application-level requirements checked after the token verifies
#[derive(Debug, Clone, Default)]
pub struct ClaimRequirements {
    pub require_email_verified: bool,
    /// Empty accepts any provider
    pub allowed_sign_in_providers: Vec<String>,
}

impl ClaimRequirements {
    pub fn from_config(config: &Config) -> Self {
        Self {
            require_email_verified: config.require_email_verified,
            allowed_sign_in_providers: config.allowed_sign_in_providers.clone(),
        }
    }

    pub fn check(&self, claims: &FirebaseClaims) -> Result<()> {
        if self.require_email_verified && claims.email_verified != Some(true) {
            return Err(ApiError::claim_validation("email address is not verified"));
        }

        if !self.allowed_sign_in_providers.is_empty() {
            let provider = claims
                .sign_in_provider()
                .ok_or_else(|| ApiError::claim_validation("token has no sign-in provider"))?;

            if !self.allowed_sign_in_providers.iter().any(|p| p == provider) {
                return Err(ApiError::claim_validation(format!(
                    "sign-in provider '{}' is not allowed",
                    provider
                )));
            }
        }

        Ok(())
    }
}
