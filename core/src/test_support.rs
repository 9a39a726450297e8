//! Mock implementations of platform traits and token minting for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use crate::error::{ApiError, Result};
use crate::platform::{CacheHint, Clock, Environment, HttpClient, HttpResponse};

/// Mock HTTP client with pre-configured responses, recording each request
pub struct MockHttp {
    responses: Vec<(String, u16, Vec<u8>)>,
    requests: Mutex<Vec<(String, CacheHint)>>,
}

impl MockHttp {
    pub fn new(responses: Vec<(&str, u16, Vec<u8>)>) -> Self {
        Self {
            responses: responses
                .into_iter()
                .map(|(pattern, status, body)| (pattern.to_string(), status, body))
                .collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<(String, CacheHint)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait(?Send)]
impl HttpClient for MockHttp {
    async fn get(&self, url: &str, _headers: &[(&str, &str)], cache: &CacheHint) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push((url.to_string(), *cache));

        for (pattern, status, body) in &self.responses {
            if url.contains(pattern.as_str()) {
                return Ok(HttpResponse {
                    status: *status,
                    body: body.clone(),
                });
            }
        }
        Err(ApiError::upstream(format!("no mock response for GET {}", url)))
    }
}

/// Mock clock with a fixed timestamp
pub struct MockClock(pub u64);

impl Clock for MockClock {
    fn now_secs(&self) -> u64 {
        self.0
    }
}

/// Mock environment backed by an in-memory HashMap
pub struct MockEnv {
    vars: HashMap<String, String>,
}

impl MockEnv {
    pub fn new(vars: &[(&str, &str)]) -> Self {
        Self {
            vars: vars
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl Environment for MockEnv {
    fn get_var(&self, name: &str) -> Result<String> {
        self.vars
            .get(name)
            .cloned()
            .ok_or_else(|| ApiError::configuration(format!("variable '{}' not found", name)))
    }
}

/// Build a certificate document body (kid -> PEM)
pub fn certificates_body(entries: &[(&str, String)]) -> Vec<u8> {
    let map: HashMap<&str, &str> = entries.iter().map(|(k, v)| (*k, v.as_str())).collect();
    serde_json::to_vec(&map).unwrap()
}

/// RSA key pair wrapped in a self-signed certificate, generated at runtime
pub struct TestSigner {
    private_pem: String,
    certificate_pem: String,
}

impl TestSigner {
    pub fn generate() -> Self {
        use rand::rngs::OsRng;
        use rsa::pkcs1::EncodeRsaPrivateKey;
        use rsa::pkcs8::{EncodePrivateKey, LineEnding};
        use rsa::RsaPrivateKey;

        let private_key = RsaPrivateKey::new(&mut OsRng, 2048).expect("key generation failed");
        let private_pem = private_key
            .to_pkcs1_pem(LineEnding::LF)
            .expect("private key PEM export failed")
            .to_string();
        let pkcs8_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .expect("PKCS#8 export failed")
            .to_string();

        let key_pair = rcgen::KeyPair::from_pem(&pkcs8_pem).expect("rcgen key import failed");
        let mut params =
            rcgen::CertificateParams::new(vec!["securetoken.system.gserviceaccount.com".to_string()])
                .expect("certificate params");
        params.not_before = rcgen::date_time_ymd(2024, 1, 1);
        params.not_after = rcgen::date_time_ymd(2034, 1, 1);
        let certificate = params.self_signed(&key_pair).expect("self-signing failed");

        Self {
            private_pem,
            certificate_pem: certificate.pem(),
        }
    }

    /// Process-wide signer, so RSA key generation runs once per test binary
    pub fn shared() -> &'static TestSigner {
        static SIGNER: OnceLock<TestSigner> = OnceLock::new();
        SIGNER.get_or_init(TestSigner::generate)
    }

    pub fn certificate_pem(&self) -> String {
        self.certificate_pem.clone()
    }

    /// Sign `claims` as an RS256 JWT
    pub fn sign(&self, kid: Option<&str>, claims: &serde_json::Value) -> String {
        use surrealdb_jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

        let mut header = Header::new(Algorithm::RS256);
        header.kid = kid.map(String::from);

        let key = EncodingKey::from_rsa_pem(self.private_pem.as_bytes()).expect("encoding key");
        encode(&header, claims, &key).expect("JWT encoding failed")
    }
}
