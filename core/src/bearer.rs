//! Bearer token extraction from an Authorization header value

/// Extract the token from an `Authorization` header value.
///
/// The value must start with `Bearer` (case-sensitive). Whatever follows is
/// trimmed; an empty remainder yields `None`.
pub fn bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}
