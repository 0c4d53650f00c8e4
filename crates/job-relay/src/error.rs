//! Request-level failures and their JSON rendering.
//!
//! Every variant is terminal for the request: the handler renders it once and
//! nothing is retried.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Failed to read request body")]
    BodyRead,

    #[error("Malformed JSON")]
    MalformedJson,

    #[error("Forbidden: missing or invalid X-API-KEY")]
    Forbidden,

    #[error("Invalid webhook URL")]
    InvalidWebhookUrl,

    #[error("Invalid webhook protocol")]
    InvalidWebhookProtocol,

    #[error("Webhook URL too long")]
    WebhookUrlTooLong,

    #[error("No webhook configured on server and client webhooks not allowed")]
    NoWebhookConfigured,

    #[error("Webhook responded with client error")]
    WebhookClientError { status: u16, body: String },

    #[error("Webhook responded with server error")]
    WebhookServerError { status: u16, body: String },

    #[error("Request to webhook timed out")]
    WebhookTimeout,

    #[error("Failed to forward to webhook")]
    WebhookTransport(String),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::BodyRead
            | RelayError::MalformedJson
            | RelayError::InvalidWebhookUrl
            | RelayError::InvalidWebhookProtocol
            | RelayError::WebhookUrlTooLong
            | RelayError::NoWebhookConfigured => StatusCode::BAD_REQUEST,
            RelayError::Forbidden => StatusCode::FORBIDDEN,
            RelayError::WebhookClientError { .. }
            | RelayError::WebhookServerError { .. }
            | RelayError::WebhookTransport(_) => StatusCode::BAD_GATEWAY,
            RelayError::WebhookTimeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// The `{ success: false, error, ... }` envelope returned to the caller.
    pub fn body(&self) -> Value {
        let mut body = json!({ "success": false, "error": self.to_string() });
        match self {
            RelayError::WebhookClientError { status, body: downstream }
            | RelayError::WebhookServerError { status, body: downstream } => {
                body["status"] = json!(status);
                body["webhook_body"] = json!(downstream);
            }
            RelayError::WebhookTransport(details) => {
                body["details"] = json!(details);
            }
            _ => {}
        }
        body
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_errors_carry_only_message() {
        let err = RelayError::MalformedJson;
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.body(),
            json!({ "success": false, "error": "Malformed JSON" })
        );
    }

    #[test]
    fn test_downstream_errors_carry_status_and_body() {
        let err = RelayError::WebhookClientError {
            status: 404,
            body: "unknown webhook".to_string(),
        };
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            err.body(),
            json!({
                "success": false,
                "error": "Webhook responded with client error",
                "status": 404,
                "webhook_body": "unknown webhook"
            })
        );
    }

    #[test]
    fn test_transport_error_carries_details() {
        let err = RelayError::WebhookTransport("connection refused".to_string());
        assert_eq!(err.body()["details"], "connection refused");
        assert_eq!(err.body()["error"], "Failed to forward to webhook");
    }

    #[test]
    fn test_timeout_is_gateway_timeout() {
        assert_eq!(RelayError::WebhookTimeout.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(RelayError::Forbidden.status(), StatusCode::FORBIDDEN);
    }
}
