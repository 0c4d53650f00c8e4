//! Tracing setup for job-relay: fmt logging with optional OTLP export.

pub mod config;
pub mod otlp;
pub mod spans;

pub use config::{OtlpProtocol, TracingConfig};
pub use otlp::{init_tracing, TracingGuard};
