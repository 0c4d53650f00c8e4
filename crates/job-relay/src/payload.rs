//! Inbound job payload extraction and chat-webhook message construction.
//!
//! The inbound body is untyped JSON: callers send whatever their game client
//! produces, so fields are coerced rather than validated.

use serde::Serialize;
use serde_json::Value;

/// Display value for a field the caller left empty.
const MISSING: &str = "N/A";

const EMBED_TITLE: &str = "Job Processing";

/// Fields the relay reads from an inbound payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobEvent {
    pub job_id: String,
    pub player_name: String,
    pub place_id: String,
}

impl JobEvent {
    /// Coerce the recognized fields to strings; absent or null becomes "".
    pub fn from_value(value: &Value) -> Self {
        Self {
            job_id: coerce_field(value, "job_id"),
            player_name: coerce_field(value, "player_name"),
            place_id: coerce_field(value, "place_id"),
        }
    }
}

fn coerce_field(value: &Value, key: &str) -> String {
    match value.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn display(field: &str) -> &str {
    if field.is_empty() {
        MISSING
    } else {
        field
    }
}

/// Chat-webhook body: a text line plus one embed.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage {
    pub content: String,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Embed {
    pub title: String,
    pub fields: Vec<EmbedField>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
}

impl EmbedField {
    fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: display(value).to_string(),
        }
    }
}

impl OutboundMessage {
    pub fn for_job(event: &JobEvent, timestamp: String) -> Self {
        let content = format!(
            "Job {} from {}",
            display(&event.job_id),
            display(&event.player_name)
        );
        Self {
            content,
            embeds: vec![Embed {
                title: EMBED_TITLE.to_string(),
                fields: vec![
                    EmbedField::new("Job ID", &event.job_id),
                    EmbedField::new("Player", &event.player_name),
                    EmbedField::new("Place ID", &event.place_id),
                ],
                timestamp,
            }],
        }
    }
}
