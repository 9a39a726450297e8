//! Firebase ID token verification
//!
//! Extracts the bearer token, looks up the signing certificate named by the
//! token's `kid`, and delegates signature/issuer/audience checks to the JWT
//! library. Time-based claims are checked against the platform clock since the
//! library's own clock is unavailable on wasm targets.

mod claims;

pub use claims::{ClaimRequirements, FirebaseClaims, FirebaseInfo};

use serde::Serialize;
use surrealdb_jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use surrealdb_jsonwebtoken::{Algorithm, DecodingKey, Header, Validation};

use crate::bearer::bearer_token;
use crate::config::{Config, CLOCK_SKEW_SECS, ISSUER_PREFIX};
use crate::decode::decode;
use crate::error::{ApiError, Result};
use crate::keys::get_key_by_kid;
use crate::platform::{Clock, HttpClient};

/// Longest accepted `sub` claim, in characters
const MAX_SUBJECT_LEN: usize = 128;

/// A token whose signature and claims have been verified
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub header: Header,
    pub claims: FirebaseClaims,
}

impl VerifiedToken {
    /// Firebase user id
    pub fn uid(&self) -> &str {
        &self.claims.sub
    }
}

/// JSON body returned to callers for a verified token
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub uid: String,
    pub claims: FirebaseClaims,
}

impl From<VerifiedToken> for VerifyResponse {
    fn from(verified: VerifiedToken) -> Self {
        Self {
            uid: verified.claims.sub.clone(),
            claims: verified.claims,
        }
    }
}

/// Verifier bound to one Firebase project
#[derive(Debug, Clone)]
pub struct Verifier {
    project_id: String,
    issuer: String,
    requirements: ClaimRequirements,
}

impl Verifier {
    pub fn new(project_id: impl Into<String>) -> Result<Self> {
        let project_id = project_id.into();
        if project_id.trim().is_empty() {
            return Err(ApiError::configuration("Firebase project id cannot be empty"));
        }

        Ok(Self {
            issuer: format!("{}{}", ISSUER_PREFIX, project_id),
            project_id,
            requirements: ClaimRequirements::default(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.project_id.clone())?
            .with_requirements(ClaimRequirements::from_config(config)))
    }

    pub fn with_requirements(mut self, requirements: ClaimRequirements) -> Self {
        self.requirements = requirements;
        self
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Verify the token carried by an `Authorization` header value
    pub async fn verify(
        &self,
        auth_header: &str,
        http: &dyn HttpClient,
        clock: &dyn Clock,
    ) -> Result<VerifiedToken> {
        let token = bearer_token(auth_header)
            .ok_or_else(|| ApiError::jwt_invalid("missing bearer token"))?;

        let decoded = decode(token)?;
        let kid = decoded
            .kid()
            .ok_or_else(|| ApiError::jwt_invalid("JWT missing 'kid' header"))?;
        if decoded.issuer().is_none() {
            return Err(ApiError::jwt_invalid("JWT missing 'iss' claim"));
        }

        let certificate = get_key_by_kid(kid, http).await?;

        self.verify_with_certificate(token, &certificate, clock.now_secs())
            .map_err(|e| {
                tracing::warn!(kid, error = %e, "jwt verification failed");
                e
            })
    }

    /// Verify `token` against a PEM certificate at time `now_secs`
    fn verify_with_certificate(
        &self,
        token: &str,
        certificate: &str,
        now_secs: u64,
    ) -> Result<VerifiedToken> {
        let key = DecodingKey::from_rsa_pem(certificate.as_bytes())
            .map_err(|e| ApiError::internal(format!("invalid signing certificate: {}", e)))?;

        // exp/nbf are checked below against the platform clock
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.project_id]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        let token_data = surrealdb_jsonwebtoken::decode::<FirebaseClaims>(token, &key, &validation)
            .map_err(map_jwt_error)?;

        check_time_claims(&token_data.claims, now_secs)?;
        check_subject(&token_data.claims.sub)?;
        self.requirements.check(&token_data.claims)?;

        Ok(VerifiedToken {
            header: token_data.header,
            claims: token_data.claims,
        })
    }
}

/// Translate JWT library failures into the verification taxonomy
fn map_jwt_error(e: JwtError) -> ApiError {
    match e.kind() {
        ErrorKind::InvalidToken
        | ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::ExpiredSignature
        | ErrorKind::ImmatureSignature
        | ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::InvalidSubject
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => ApiError::jwt_verification(e.to_string()),
        _ => ApiError::internal(format!("JWT library error: {}", e)),
    }
}

fn check_time_claims(claims: &FirebaseClaims, now_secs: u64) -> Result<()> {
    if claims.exp <= now_secs {
        return Err(ApiError::jwt_verification("token has expired"));
    }

    if claims.iat > now_secs + CLOCK_SKEW_SECS {
        return Err(ApiError::jwt_verification("token issued in the future (iat claim)"));
    }

    if let Some(nbf) = claims.nbf {
        if nbf > now_secs + CLOCK_SKEW_SECS {
            return Err(ApiError::jwt_verification("token is not yet valid (nbf claim)"));
        }
    }

    if let Some(auth_time) = claims.auth_time {
        if auth_time > now_secs + CLOCK_SKEW_SECS {
            return Err(ApiError::jwt_verification(
                "authentication time is in the future (auth_time claim)",
            ));
        }
    }

    Ok(())
}

fn check_subject(sub: &str) -> Result<()> {
    if sub.is_empty() {
        return Err(ApiError::jwt_verification("subject cannot be empty"));
    }
    if sub.chars().count() > MAX_SUBJECT_LEN {
        return Err(ApiError::jwt_verification("subject too long"));
    }
    Ok(())
}
