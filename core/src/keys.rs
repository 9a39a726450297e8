//! Signing certificate lookup
//!
//! Google publishes the certificates that sign Firebase ID tokens as a JSON
//! object mapping key id to a PEM-encoded X.509 certificate.

use std::collections::HashMap;

use crate::config::{CERTIFICATES_CACHE, CERTIFICATES_URL, USER_AGENT};
use crate::error::{ApiError, Result};
use crate::platform::HttpClient;

/// Fetch the PEM certificate for `kid`
pub async fn get_key_by_kid(kid: &str, http: &dyn HttpClient) -> Result<String> {
    let mut certificates = fetch_certificates(http).await?;

    certificates.remove(kid).ok_or_else(|| {
        tracing::warn!(kid, "no published certificate matches token kid");
        ApiError::no_matching_key(kid)
    })
}

/// Fetch the full kid -> certificate document
pub async fn fetch_certificates(http: &dyn HttpClient) -> Result<HashMap<String, String>> {
    let response = http
        .get(
            CERTIFICATES_URL,
            &[("Accept", "application/json"), ("User-Agent", USER_AGENT)],
            &CERTIFICATES_CACHE,
        )
        .await
        .map_err(|e| ApiError::upstream(format!("failed to fetch signing certificates: {}", e)))?;

    if response.status != 200 {
        return Err(ApiError::upstream(format!(
            "failed to fetch signing certificates: HTTP {}",
            response.status
        )));
    }

    response
        .json()
        .map_err(|e| ApiError::upstream(format!("invalid signing certificate document: {}", e)))
}
