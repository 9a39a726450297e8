//! firebase-jwt-core: Platform-agnostic Firebase ID token verification
//!
//! This crate extracts bearer tokens, looks up Google's signing certificates and
//! verifies Firebase ID tokens. It depends only on abstract platform traits
//! (HttpClient, Clock, Environment) and never imports platform-specific code.

pub mod bearer;
pub mod config;
pub mod decode;
pub mod error;
pub mod keys;
pub mod platform;
pub mod verify;

pub use bearer::bearer_token;
pub use decode::{decode, DecodedToken};
pub use error::{ApiError, ErrorResponse, Result};
pub use keys::get_key_by_kid;
pub use verify::{
    ClaimRequirements, FirebaseClaims, FirebaseInfo, VerifiedToken, Verifier, VerifyResponse,
};

#[cfg(test)]
pub mod test_support;
