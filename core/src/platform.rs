//! Platform abstraction traits
//!
//! These traits define the boundary between platform-agnostic verification logic
//! and platform-specific implementations (Cloudflare Workers, GCP Cloud Run, etc.)

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::Result;

/// HTTP client for outbound requests (signing certificate fetch)
#[async_trait(?Send)]
pub trait HttpClient {
    async fn get(&self, url: &str, headers: &[(&str, &str)], cache: &CacheHint) -> Result<HttpResponse>;
}

/// HTTP response from an outbound request
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Parse body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> std::result::Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Inclusive range of HTTP status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRange {
    pub start: u16,
    pub end: u16,
}

impl StatusRange {
    pub const fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    pub const fn single(status: u16) -> Self {
        Self::new(status, status)
    }

    pub fn contains(&self, status: u16) -> bool {
        (self.start..=self.end).contains(&status)
    }

    /// Render as a cache rule key, e.g. "200-299" or "404"
    pub fn key(&self) -> String {
        if self.start == self.end {
            self.start.to_string()
        } else {
            format!("{}-{}", self.start, self.end)
        }
    }
}

/// Caching instruction handed to the platform fetch.
///
/// A TTL of zero (or a negative one) means the response must not be cached.
#[derive(Debug, Clone, Copy)]
pub struct CacheHint {
    pub cache_everything: bool,
    pub ttl_by_status: &'static [(StatusRange, i32)],
}

impl CacheHint {
    /// TTL in seconds for a response with the given status, first match wins
    pub fn ttl_for(&self, status: u16) -> Option<i32> {
        self.ttl_by_status
            .iter()
            .find(|(range, _)| range.contains(status))
            .map(|(_, ttl)| *ttl)
    }
}

/// Clock for current time (enables testing with deterministic timestamps)
pub trait Clock {
    fn now_secs(&self) -> u64;
}

/// Environment/configuration access
pub trait Environment {
    fn get_var(&self, name: &str) -> Result<String>;
}
