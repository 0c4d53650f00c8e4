//! Outbound delivery of the chat-webhook message.
//!
//! One attempt per inbound request. The whole exchange (send + reading the
//! downstream body) runs under a deadline; when it elapses the in-flight
//! future is dropped, which cancels the connection.

use std::time::{Duration, Instant};

use tracing::Instrument;

use crate::error::RelayError;
use crate::payload::OutboundMessage;
use crate::target::ForwardingTarget;

/// Downstream answer as far as the relay cares about it.
#[derive(Debug)]
struct Downstream {
    status: u16,
    body: String,
}

/// POST `message` to `target`, returning the downstream status on 2xx.
pub async fn deliver(
    client: &reqwest::Client,
    target: &ForwardingTarget,
    message: &OutboundMessage,
    deadline: Duration,
    request_id: &str,
) -> Result<u16, RelayError> {
    let span = relay_tracing::webhook_forward_span!(request_id, target.host());
    let start = Instant::now();

    async {
        let result = tokio::time::timeout(deadline, send(client, &target.url, message)).await;

        let latency = start.elapsed().as_millis() as u64;
        tracing::Span::current().record("latency_ms", latency);

        let downstream = match result {
            Ok(Ok(downstream)) => downstream,
            Ok(Err(e)) if e.is_timeout() => {
                tracing::warn!(latency_ms = latency, "Webhook request timed out");
                return Err(RelayError::WebhookTimeout);
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, latency_ms = latency, "Webhook request failed");
                return Err(RelayError::WebhookTransport(e.to_string()));
            }
            Err(_) => {
                tracing::warn!(
                    latency_ms = latency,
                    deadline_ms = deadline.as_millis() as u64,
                    "Webhook request exceeded deadline"
                );
                return Err(RelayError::WebhookTimeout);
            }
        };

        tracing::Span::current().record("status", downstream.status);
        classify(downstream)
    }
    .instrument(span)
    .await
}

async fn send(
    client: &reqwest::Client,
    url: &str,
    message: &OutboundMessage,
) -> Result<Downstream, reqwest::Error> {
    let response = client.post(url).json(message).send().await?;
    let status = response.status().as_u16();
    // The body is only reported back to the caller; an unreadable one is not
    // worth failing the request over.
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!(error = %e, status = status, "Failed to read webhook response body");
            String::new()
        }
    };
    Ok(Downstream { status, body })
}

fn classify(downstream: Downstream) -> Result<u16, RelayError> {
    let Downstream { status, body } = downstream;
    match status {
        200..=299 => {
            tracing::info!(status = status, "Webhook accepted message");
            Ok(status)
        }
        400..=499 => {
            tracing::warn!(status = status, "Webhook responded with client error");
            Err(RelayError::WebhookClientError { status, body })
        }
        _ => {
            tracing::warn!(status = status, "Webhook responded with server error");
            Err(RelayError::WebhookServerError { status, body })
        }
    }
}
