//! job-relay: stateless relay that turns job notifications into chat-webhook
//! messages.

mod auth;
mod clock;
mod config;
mod correlation;
mod cors;
mod error;
mod forward;
mod payload;
mod server;
mod target;

use clock::Clock;
use config::RelayConfig;
use server::AppState;

fn main() -> anyhow::Result<()> {
    // --config <path>, then positional arg, then env, then default
    let args: Vec<String> = std::env::args().collect();
    let config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1).cloned())
        .or_else(|| args.get(1).filter(|a| !a.starts_with('-')).cloned())
        .or_else(|| std::env::var("JOB_RELAY_CONFIG").ok())
        .unwrap_or_else(|| "job-relay.toml".to_string());

    let config = RelayConfig::load(&config_path)?;

    // The tonic gRPC exporter needs a reactor, so build the runtime before tracing
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let tracing_guard = relay_tracing::init_tracing(&config.tracing);

        tracing::info!(
            config_path = %config_path,
            listen_address = %config.server.listen_address,
            auth_enabled = config.forwarding.secret().is_some(),
            fixed_webhook = config.forwarding.fixed_webhook().is_some(),
            allow_client_webhook = config.forwarding.allow_client_webhook,
            timeout_ms = config.forwarding.timeout_ms,
            otlp_export = tracing_guard.exporting(),
            "Starting job-relay"
        );

        if config.forwarding.fixed_webhook().is_none() && !config.forwarding.allow_client_webhook {
            tracing::warn!("No WEBHOOK_URL and client webhooks disabled; every forward will be rejected");
        }

        run(config).await
    })
}

async fn run(config: RelayConfig) -> anyhow::Result<()> {
    // Per-request deadlines are applied in `forward::deliver`, so the client
    // itself carries no timeout.
    let client = reqwest::Client::builder().build()?;

    let state = AppState {
        config,
        client,
        clock: Clock::system(),
    };

    server::run(state).await
}
