//! Span builder helpers for job-relay instrumentation.

/// Create the top-level span for one inbound request.
///
/// Usage: `let span = relay_request_span!(request_id, method, path);`
///
/// `status` is recorded once the handler has produced a response.
#[macro_export]
macro_rules! relay_request_span {
    ($request_id:expr, $method:expr, $path:expr) => {
        tracing::info_span!(
            "relay_request",
            request_id = %$request_id,
            method = %$method,
            path = %$path,
            status = tracing::field::Empty,
        )
    };
}

/// Create a span for the outbound webhook call.
///
/// Only the target host is recorded; webhook URLs usually embed a token.
#[macro_export]
macro_rules! webhook_forward_span {
    ($request_id:expr, $host:expr) => {
        tracing::info_span!(
            "webhook_forward",
            request_id = %$request_id,
            target_host = %$host,
            status = tracing::field::Empty,
            latency_ms = tracing::field::Empty,
        )
    };
}
