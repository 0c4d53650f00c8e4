//! Webhook target resolution.
//!
//! Precedence: the server's fixed URL, then a validated client URL (only when
//! client webhooks are enabled), otherwise the request is rejected without any
//! outbound call.

use serde_json::Value;
use url::Url;

use crate::config::ForwardingConfig;
use crate::error::RelayError;

/// Longest client-supplied webhook URL accepted, in characters.
pub const MAX_WEBHOOK_URL_LEN: usize = 2000;

/// Where a resolved target came from. Logged, never returned to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSource {
    Server,
    Client,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardingTarget {
    pub url: String,
    pub source: TargetSource,
    host: String,
}

impl ForwardingTarget {
    pub fn new(url: String, source: TargetSource) -> Self {
        let host = Url::parse(&url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string());
        Self { url, source, host }
    }

    /// Host portion for logs. Userinfo, path, and query can all carry
    /// credentials, so nothing else of the URL is exposed.
    pub fn host(&self) -> &str {
        &self.host
    }
}

pub fn resolve(config: &ForwardingConfig, payload: &Value) -> Result<ForwardingTarget, RelayError> {
    if let Some(url) = config.fixed_webhook() {
        return Ok(ForwardingTarget::new(url.to_string(), TargetSource::Server));
    }

    if config.allow_client_webhook {
        if let Some(raw) = client_webhook(payload)? {
            return Ok(ForwardingTarget::new(
                validate_client_url(raw)?,
                TargetSource::Client,
            ));
        }
    }

    Err(RelayError::NoWebhookConfigured)
}

/// The payload's `webhook` field. Missing, null, and "" all count as absent;
/// any other non-string value is rejected as an invalid URL.
fn client_webhook(payload: &Value) -> Result<Option<&str>, RelayError> {
    match payload.get("webhook") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(RelayError::InvalidWebhookUrl),
    }
}

fn validate_client_url(raw: &str) -> Result<String, RelayError> {
    let parsed = Url::parse(raw).map_err(|_| RelayError::InvalidWebhookUrl)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(RelayError::InvalidWebhookProtocol);
    }
    if raw.chars().count() > MAX_WEBHOOK_URL_LEN {
        return Err(RelayError::WebhookUrlTooLong);
    }
    Ok(raw.to_string())
}
