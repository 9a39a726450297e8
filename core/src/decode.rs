//! Unverified token decoding
//!
//! Reads the JOSE header and payload of a compact JWT without checking the
//! signature, so the verifier can learn which key and issuer to use.

use serde_json::{Map, Value};
use surrealdb_jsonwebtoken::{decode_header, Header};

use crate::error::{ApiError, Result};

/// Header and payload of a token whose signature has not been checked
#[derive(Debug, Clone)]
pub struct DecodedToken {
    pub header: Header,
    pub payload: Map<String, Value>,
}

impl DecodedToken {
    /// Key id from the header, if present and non-empty
    pub fn kid(&self) -> Option<&str> {
        self.header.kid.as_deref().filter(|kid| !kid.is_empty())
    }

    /// Issuer claim, if present and a non-empty string
    pub fn issuer(&self) -> Option<&str> {
        self.payload
            .get("iss")
            .and_then(Value::as_str)
            .filter(|iss| !iss.is_empty())
    }
}

/// Decode a compact JWT into header and payload without verification
pub fn decode(token: &str) -> Result<DecodedToken> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(ApiError::jwt_invalid("invalid JWT format"));
    }

    let header = decode_header(token)
        .map_err(|e| ApiError::jwt_invalid(format!("invalid JWT header: {}", e)))?;

    let payload = base64_url_decode(parts[1])?;
    let payload: Map<String, Value> = serde_json::from_slice(&payload)
        .map_err(|e| ApiError::jwt_invalid(format!("invalid JWT payload: {}", e)))?;

    Ok(DecodedToken { header, payload })
}

/// Base64 URL decode
fn base64_url_decode(input: &str) -> Result<Vec<u8>> {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    URL_SAFE_NO_PAD
        .decode(input)
        .or_else(|_| {
            use base64::engine::general_purpose::URL_SAFE;
            URL_SAFE.decode(input)
        })
        .map_err(|e| ApiError::jwt_invalid(format!("invalid base64: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    fn segment(value: serde_json::Value) -> String {
        URL_SAFE_NO_PAD.encode(value.to_string())
    }

    fn unsigned_token(header: serde_json::Value, payload: serde_json::Value) -> String {
        format!("{}.{}.c2ln", segment(header), segment(payload))
    }

    #[test]
    fn test_decode_reads_kid_and_issuer() {
        let token = unsigned_token(
            serde_json::json!({"alg": "RS256", "kid": "key-1", "typ": "JWT"}),
            serde_json::json!({"iss": "https://securetoken.google.com/demo", "sub": "u1"}),
        );

        let decoded = decode(&token).unwrap();
        assert_eq!(decoded.kid(), Some("key-1"));
        assert_eq!(decoded.issuer(), Some("https://securetoken.google.com/demo"));
        assert_eq!(decoded.payload["sub"], "u1");
    }

    #[test]
    fn test_decode_missing_kid_and_issuer() {
        let token = unsigned_token(
            serde_json::json!({"alg": "RS256"}),
            serde_json::json!({"iss": "", "sub": "u1"}),
        );

        let decoded = decode(&token).unwrap();
        assert_eq!(decoded.kid(), None);
        assert_eq!(decoded.issuer(), None);
    }

    #[test]
    fn test_decode_non_string_issuer() {
        let token = unsigned_token(
            serde_json::json!({"alg": "RS256", "kid": "k"}),
            serde_json::json!({"iss": 42}),
        );
        assert_eq!(decode(&token).unwrap().issuer(), None);
    }

    #[test]
    fn test_decode_wrong_segment_count() {
        let err = decode("only.two").unwrap_err();
        assert!(matches!(err, ApiError::JwtInvalid { .. }));

        assert!(decode("a.b.c.d").is_err());
        assert!(decode("").is_err());
    }

    #[test]
    fn test_decode_bad_payload() {
        let header = segment(serde_json::json!({"alg": "RS256"}));

        let not_base64 = format!("{}.!!!.sig", header);
        assert!(matches!(decode(&not_base64), Err(ApiError::JwtInvalid { .. })));

        let not_object = format!("{}.{}.sig", header, URL_SAFE_NO_PAD.encode("[1,2]"));
        assert!(matches!(decode(&not_object), Err(ApiError::JwtInvalid { .. })));
    }

    #[test]
    fn test_decode_bad_header() {
        let token = format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode("not json"),
            segment(serde_json::json!({"iss": "x"}))
        );
        assert!(matches!(decode(&token), Err(ApiError::JwtInvalid { .. })));
    }
}
