//! GCP platform implementations
//!
//! Implements core platform traits using native Rust libraries:
//! - HttpClient: reqwest, fronted by a moka response cache that honours cache hints
//! - Clock: std::time::SystemTime
//! - Environment: std::env

use async_trait::async_trait;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use firebase_jwt_core::error::{ApiError, Result};
use firebase_jwt_core::platform::{CacheHint, Clock, Environment, HttpClient, HttpResponse};

/// Upper bound on the number of cached responses
const MAX_CACHED_RESPONSES: u64 = 64;

/// A cached response and the instant (unix seconds) it stops being fresh
#[derive(Clone)]
struct CachedResponse {
    status: u16,
    body: Vec<u8>,
    expires_at: u64,
}

/// reqwest-based HTTP client with an in-memory response cache
///
/// There is no edge cache in front of a Cloud Run instance, so cache hints
/// are applied here: a response is kept for the TTL its status maps to.
pub struct CachingHttpClient<C: Clock> {
    client: reqwest::Client,
    cache: moka::future::Cache<String, CachedResponse>,
    clock: C,
}

impl CachingHttpClient<SystemClock> {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new(), SystemClock)
    }
}

impl<C: Clock> CachingHttpClient<C> {
    pub fn with_client(client: reqwest::Client, clock: C) -> Self {
        Self {
            client,
            cache: moka::future::Cache::builder()
                .max_capacity(MAX_CACHED_RESPONSES)
                .build(),
            clock,
        }
    }

    async fn cached(&self, url: &str) -> Option<HttpResponse> {
        let entry = self.cache.get(url).await?;
        if entry.expires_at <= self.clock.now_secs() {
            self.cache.invalidate(url).await;
            return None;
        }

        Some(HttpResponse {
            status: entry.status,
            body: entry.body,
        })
    }

    async fn store(&self, url: &str, response: &HttpResponse, cache: &CacheHint) {
        let ttl = match cache.ttl_for(response.status) {
            Some(ttl) if ttl > 0 => ttl as u64,
            Some(_) => return,
            None if cache.cache_everything && (200..300).contains(&response.status) => {
                DEFAULT_TTL_SECS
            }
            None => return,
        };

        tracing::debug!(url, status = response.status, ttl, "caching response");
        self.cache
            .insert(
                url.to_string(),
                CachedResponse {
                    status: response.status,
                    body: response.body.clone(),
                    expires_at: self.clock.now_secs() + ttl,
                },
            )
            .await;
    }
}

/// TTL for cache-everything responses whose status has no explicit rule
const DEFAULT_TTL_SECS: u64 = 3600;

#[async_trait(?Send)]
impl<C: Clock> HttpClient for CachingHttpClient<C> {
    async fn get(&self, url: &str, headers: &[(&str, &str)], cache: &CacheHint) -> Result<HttpResponse> {
        if let Some(response) = self.cached(url).await {
            tracing::debug!(url, "response cache hit");
            return Ok(response);
        }

        let mut builder = self.client.get(url);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::upstream(format!("HTTP GET failed: {}", e)))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::upstream(format!("failed to read response: {}", e)))?
            .to_vec();

        let response = HttpResponse { status, body };
        self.store(url, &response, cache).await;
        Ok(response)
    }
}

/// System clock using std::time
#[derive(Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs()
    }
}

/// Process environment
pub struct GcpEnv;

impl Environment for GcpEnv {
    fn get_var(&self, name: &str) -> Result<String> {
        std::env::var(name)
            .map_err(|_| ApiError::configuration(format!("environment variable '{}' not set", name)))
    }
}
