//! Axum HTTP server: router, handlers, listener, graceful shutdown.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde_json::{json, Map, Value};
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use crate::auth::{self, API_KEY_HEADER};
use crate::clock::Clock;
use crate::config::RelayConfig;
use crate::correlation;
use crate::cors;
use crate::error::RelayError;
use crate::forward;
use crate::payload::{JobEvent, OutboundMessage};
use crate::target;

/// Shared application state. Read-only once the server is running.
#[derive(Clone)]
pub struct AppState {
    pub config: RelayConfig,
    pub client: reqwest::Client,
    pub clock: Clock,
}

/// Build the router: health on `/` and `/health`, diagnostics on `/debug`,
/// forwarding on every other POST, and 404 for anything else.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_health).head(handle_fallback).fallback(handle_fallback))
        .route(
            "/health",
            get(handle_health).head(handle_fallback).fallback(handle_fallback),
        )
        .route("/debug", post(handle_debug).fallback(handle_fallback))
        .fallback(handle_fallback)
        .layer(middleware::from_fn(cors::layer))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Build and run the HTTP server.
pub async fn run(state: AppState) -> anyhow::Result<()> {
    let listen_addr = state.config.server.listen_address.clone();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    tracing::info!(address = %listen_addr, "job-relay listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("job-relay shut down gracefully");
    Ok(())
}

/// Liveness probe.
async fn handle_health(State(state): State<Arc<AppState>>) -> Response {
    Json(json!({ "ok": true, "ts": state.clock.timestamp() })).into_response()
}

/// Catch-all: POST on any path forwards a job, everything else is 404.
async fn handle_fallback(state: State<Arc<AppState>>, request: Request) -> Response {
    if request.method() == Method::POST {
        return handle_forward(state, request).await;
    }
    not_found()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}

/// Forward a job notification to the resolved webhook.
///
/// 1. Read and parse the body
/// 2. Check the API key
/// 3. Resolve the target
/// 4. Build the chat message and deliver it once, under the deadline
async fn handle_forward(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let request_id = correlation::generate_id();
    let span = relay_tracing::relay_request_span!(&request_id, request.method(), request.uri().path());

    async {
        let response = match forward_job(&state, request, &request_id).await {
            Ok(webhook_status) => Json(json!({
                "success": true,
                "forwarded": true,
                "webhook_status": webhook_status,
            }))
            .into_response(),
            Err(e) => {
                tracing::info!(error = %e, "Request not forwarded");
                e.into_response()
            }
        };
        tracing::Span::current().record("status", response.status().as_u16());
        response
    }
    .instrument(span)
    .await
}

async fn forward_job(state: &AppState, request: Request, request_id: &str) -> Result<u16, RelayError> {
    let (parts, body) = request.into_parts();
    let payload = read_payload(body, state.config.server.body_limit_bytes).await?;

    if !auth::check(&parts.headers, state.config.forwarding.secret()).allowed() {
        tracing::warn!("Rejected request with missing or invalid API key");
        return Err(RelayError::Forbidden);
    }

    let event = JobEvent::from_value(&payload);
    let target = target::resolve(&state.config.forwarding, &payload)?;

    tracing::info!(
        job_id = %event.job_id,
        source = ?target.source,
        target_host = %target.host(),
        "Forwarding job notification"
    );

    let message = OutboundMessage::for_job(&event, state.clock.timestamp());
    forward::deliver(
        &state.client,
        &target,
        &message,
        state.config.forwarding.timeout(),
        request_id,
    )
    .await
}

/// Echo what the relay received, and whether the key would have passed.
///
/// Authentication is evaluated but not enforced here so callers can see the
/// headers their HTTP stack actually sends. Never used for forwarding.
async fn handle_debug(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let request_id = correlation::generate_id();
    let span = relay_tracing::relay_request_span!(&request_id, request.method(), request.uri().path());

    async {
        let (parts, body) = request.into_parts();
        let payload = match read_payload(body, state.config.server.body_limit_bytes).await {
            Ok(payload) => payload,
            Err(e) => return e.into_response(),
        };

        let secret = state.config.forwarding.secret();
        let check = auth::check(&parts.headers, secret);
        let status = if check.allowed() {
            StatusCode::OK
        } else {
            StatusCode::FORBIDDEN
        };
        tracing::info!(allowed = check.allowed(), "Debug echo");
        tracing::Span::current().record("status", status.as_u16());

        (
            status,
            Json(json!({
                "success": check.allowed(),
                "key_matched": check == auth::KeyCheck::Matched,
                "secret_configured": secret.is_some(),
                "headers": echo_headers(&parts.headers),
                "body": payload,
            })),
        )
            .into_response()
    }
    .instrument(span)
    .await
}

/// Flatten headers to a JSON object, joining repeated names with ", ".
/// The API key value is never echoed.
fn echo_headers(headers: &HeaderMap) -> Value {
    let mut out = Map::new();
    for name in headers.keys() {
        let value = if name.as_str() == API_KEY_HEADER {
            "<redacted>".to_string()
        } else {
            headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(", ")
        };
        out.insert(name.as_str().to_string(), Value::String(value));
    }
    Value::Object(out)
}

/// Read the request body and parse it as JSON. An empty body is `{}`.
async fn read_payload(body: Body, limit: usize) -> Result<Value, RelayError> {
    let bytes = axum::body::to_bytes(body, limit).await.map_err(|e| {
        tracing::warn!(error = %e, "Failed to read request body");
        RelayError::BodyRead
    })?;
    parse_payload(&bytes)
}

fn parse_payload(bytes: &Bytes) -> Result<Value, RelayError> {
    let text = std::str::from_utf8(bytes).map_err(|_| RelayError::BodyRead)?;
    if text.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_str(text).map_err(|e| {
        tracing::debug!(error = %e, "Request body is not valid JSON");
        RelayError::MalformedJson
    })
}

/// Wait for SIGINT (Ctrl+C) for graceful shutdown.
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C signal handler");
    tracing::info!("Shutdown signal received, draining connections...");
}
