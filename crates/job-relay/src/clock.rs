//! Injectable time source.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};

/// Shared handle to "now". Production uses the system clock; tests pin it.
#[derive(Clone)]
pub struct Clock {
    now: Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>,
}

impl Clock {
    pub fn system() -> Self {
        Self {
            now: Arc::new(Utc::now),
        }
    }

    #[cfg(test)]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(move || at),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.now)()
    }

    /// Current time as ISO-8601 with millisecond precision and a `Z` suffix,
    /// e.g. `2025-03-01T12:00:00.000Z`.
    pub fn timestamp(&self) -> String {
        self.now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}
