//! Cloudflare Workers platform implementations
//!
//! Implements the core platform traits for the Fetch API, js_sys clock, and Env.

use async_trait::async_trait;
use std::collections::HashMap;
use worker::{CfProperties, Env, Fetch, Headers, Method, RequestInit};

use firebase_jwt_core::error::{ApiError, Result};
use firebase_jwt_core::platform::{CacheHint, Clock, Environment, HttpClient, HttpResponse};

/// Workers Fetch API HTTP client
///
/// Cache hints are handed to Cloudflare's edge cache through the request's
/// `cf` properties rather than cached in the isolate.
pub struct WorkersFetchClient;

#[async_trait(?Send)]
impl HttpClient for WorkersFetchClient {
    async fn get(&self, url: &str, headers: &[(&str, &str)], cache: &CacheHint) -> Result<HttpResponse> {
        let mut worker_headers = Headers::new();
        for (name, value) in headers {
            worker_headers
                .set(name, value)
                .map_err(|_| ApiError::internal(format!("failed to set header: {}", name)))?;
        }

        let mut init = RequestInit::new();
        init.with_method(Method::Get)
            .with_headers(worker_headers)
            .with_cf_properties(cf_properties(cache));

        let request = worker::Request::new_with_init(url, &init)
            .map_err(|_| ApiError::internal(format!("failed to create request for {}", url)))?;

        let mut response = Fetch::Request(request)
            .send()
            .await
            .map_err(|e| ApiError::upstream(format!("fetch failed for {}: {}", url, e)))?;

        let status = response.status_code();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::upstream(format!("failed to read response body: {}", e)))?;

        Ok(HttpResponse { status, body })
    }
}

fn cf_properties(cache: &CacheHint) -> CfProperties {
    let ttl_by_status: HashMap<String, i32> = cache
        .ttl_by_status
        .iter()
        .map(|(range, ttl)| (range.key(), *ttl))
        .collect();

    CfProperties {
        cache_everything: Some(cache.cache_everything),
        cache_ttl_by_status: (!ttl_by_status.is_empty()).then_some(ttl_by_status),
        ..CfProperties::default()
    }
}

/// js_sys clock using Date.now()
pub struct JsClock;

impl Clock for JsClock {
    fn now_secs(&self) -> u64 {
        (js_sys::Date::now() / 1000.0) as u64
    }
}

/// Workers Env adapter for Environment trait
pub struct WorkersEnv<'a> {
    env: &'a Env,
}

impl<'a> WorkersEnv<'a> {
    pub fn new(env: &'a Env) -> Self {
        Self { env }
    }
}

impl Environment for WorkersEnv<'_> {
    fn get_var(&self, name: &str) -> Result<String> {
        if let Ok(value) = self.env.var(name) {
            return Ok(value.to_string());
        }

        self.env
            .secret(name)
            .map(|v| v.to_string())
            .map_err(|_| ApiError::configuration(format!("variable '{}' not found", name)))
    }
}
