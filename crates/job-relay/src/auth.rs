//! Shared-secret check on the `X-API-KEY` header.

use axum::http::HeaderMap;

/// Header carrying the caller's key. `HeaderMap` lookups are case-insensitive.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Outcome of comparing the request's key against the configured secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCheck {
    /// No secret configured; every caller is trusted.
    Open,
    Matched,
    Rejected,
}

impl KeyCheck {
    pub fn allowed(self) -> bool {
        !matches!(self, KeyCheck::Rejected)
    }
}

pub fn check(headers: &HeaderMap, secret: Option<&str>) -> KeyCheck {
    let Some(secret) = secret else {
        return KeyCheck::Open;
    };
    let presented = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    if presented == Some(secret) {
        KeyCheck::Matched
    } else {
        KeyCheck::Rejected
    }
}
