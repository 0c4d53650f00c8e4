//! Configuration types and loading logic.

use std::time::Duration;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use relay_tracing::TracingConfig;
use serde::Deserialize;

/// Environment key holding the shared secret callers must present.
pub const SECRET_API_KEY_ENV: &str = "SECRET_API_KEY";
/// Environment key holding the fixed forwarding target.
pub const WEBHOOK_URL_ENV: &str = "WEBHOOK_URL";
/// Environment key that enables client-supplied targets when set to "true".
pub const ALLOW_CLIENT_WEBHOOK_ENV: &str = "ALLOW_CLIENT_WEBHOOK";

/// Top-level relay configuration. Built once at startup, never mutated after.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub forwarding: ForwardingConfig,
    #[serde(default)]
    pub tracing: TracingConfig,
}

/// Server listen configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Upper bound on inbound request bodies.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

/// Authentication and webhook target policy.
#[derive(Debug, Clone, Deserialize)]
pub struct ForwardingConfig {
    /// When set, callers must send it verbatim in `X-API-KEY`.
    #[serde(default)]
    pub secret_api_key: Option<String>,

    /// Fixed target. Takes precedence over anything the client sends.
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Accept the payload's `webhook` field when no fixed target is set.
    #[serde(default)]
    pub allow_client_webhook: bool,

    /// Deadline for the outbound webhook call.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_listen_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_body_limit() -> usize {
    10 * 1024 * 1024
}

fn default_timeout_ms() -> u64 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            secret_api_key: None,
            webhook_url: None,
            allow_client_webhook: false,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ForwardingConfig {
    /// Configured secret, treating an empty value as unset.
    pub fn secret(&self) -> Option<&str> {
        self.secret_api_key.as_deref().filter(|s| !s.is_empty())
    }

    /// Configured fixed target, treating an empty value as unset.
    pub fn fixed_webhook(&self) -> Option<&str> {
        self.webhook_url.as_deref().filter(|s| !s.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Apply the unprefixed deployment keys (`SECRET_API_KEY`, `WEBHOOK_URL`,
    /// `ALLOW_CLIENT_WEBHOOK`). A key that is present always wins over the
    /// file and `RELAY_` values.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(SECRET_API_KEY_ENV) {
            self.secret_api_key = Some(key);
        }
        if let Some(url) = lookup(WEBHOOK_URL_ENV) {
            self.webhook_url = Some(url);
        }
        if let Some(flag) = lookup(ALLOW_CLIENT_WEBHOOK_ENV) {
            self.allow_client_webhook = flag.trim().eq_ignore_ascii_case("true");
        }
    }
}

impl RelayConfig {
    /// Load configuration from TOML file and environment variables.
    ///
    /// Priority (highest to lowest):
    /// 1. `SECRET_API_KEY`, `WEBHOOK_URL`, `ALLOW_CLIENT_WEBHOOK`
    /// 2. Environment variables (RELAY_ prefix, __ for nesting)
    /// 3. TOML config file (optional)
    /// 4. Defaults
    pub fn load(config_path: &str) -> anyhow::Result<Self> {
        let mut config: RelayConfig = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("RELAY_").split("__"))
            .extract()?;

        config
            .forwarding
            .apply_overrides(|key| std::env::var(key).ok());

        Ok(config)
    }
}
