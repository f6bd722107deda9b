//! Report formatting
//!
//! Turns computed metrics into the side-channel message posted back into
//! the session. The message never triggers a reply and is excluded from
//! the assistant's future context.

use crate::calculator::TurnMetrics;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata key carrying the reporter tag
pub const SOURCE_METADATA_KEY: &str = "source";

/// Format metrics as the display string, e.g. `▣ Lat.: 0.20s | E2E TPS: 40`
pub fn format_report(label: &str, metrics: &TurnMetrics) -> String {
    let latency = match metrics.time_to_first_token_ms {
        Some(ms) => format!("{:.2}s", ms / 1000.0),
        None => "n/a".to_string(),
    };
    format!("{} Lat.: {} | E2E TPS: {}", label, latency, metrics.tps)
}

/// A text part of a report message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPart {
    pub text: String,

    /// Excluded from the assistant's context
    pub ignored: bool,

    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Message posted to a session to report a turn's metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMessage {
    /// Posting must not start a new assistant generation
    pub no_reply: bool,

    pub parts: Vec<ReportPart>,
}

impl ReportMessage {
    /// Build a non-replying, context-ignored report with one text part
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert(SOURCE_METADATA_KEY.to_string(), source.into());
        Self {
            no_reply: true,
            parts: vec![ReportPart {
                text: text.into(),
                ignored: true,
                metadata,
            }],
        }
    }

    /// Display text of the report
    pub fn text(&self) -> &str {
        self.parts.first().map(|p| p.text.as_str()).unwrap_or_default()
    }
}

/// A dispatched turn report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnReport {
    pub session_id: String,

    /// The terminal message that triggered the report
    pub message_id: String,

    /// Every assistant message aggregated into the turn
    pub turn_message_ids: Vec<String>,

    pub metrics: TurnMetrics,

    pub text: String,
}
