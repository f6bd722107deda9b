//! Turn metric calculation
//!
//! A pure function from one turn aggregate to tokens-per-second and
//! time-to-first-token. Inputs that cannot produce a meaningful rate yield
//! `None` rather than an error.

use crate::timestamp::TimestampUnit;
use serde::{Deserialize, Serialize};

/// Aggregated description of one completed turn
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnInput {
    /// Output plus reasoning tokens across every message of the turn
    pub output_tokens: u64,

    /// Earliest creation time of the turn's messages
    pub created_at: f64,

    /// Completion time of the message that ended the turn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_token_at: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_token_at: Option<f64>,

    /// Merged tool-busy time in milliseconds (a duration, never rescaled)
    #[serde(default)]
    pub tool_execution_ms: f64,

    /// Unit of the timestamp fields above
    #[serde(default)]
    pub unit: TimestampUnit,
}

/// Computed turn metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnMetrics {
    /// Tokens per second, rounded to two decimals
    pub tps: f64,

    /// Latency from turn start to first fragment; `None` when never observed
    pub time_to_first_token_ms: Option<f64>,
}

/// Compute TPS and TTFT for a turn, or `None` when the data is insufficient
pub fn calculate_tps(input: &TurnInput) -> Option<TurnMetrics> {
    if input.output_tokens == 0 {
        return None;
    }

    let unit = input.unit;
    let created_at = unit.to_millis(input.created_at)?;
    let completed_at = unit
        .normalize(input.last_token_at)
        .or_else(|| unit.normalize(input.completed_at))?;

    let duration_ms = completed_at - created_at;
    if !duration_ms.is_finite() || duration_ms <= 0.0 {
        return None;
    }

    let tool_execution_ms = if input.tool_execution_ms.is_finite() {
        input.tool_execution_ms.max(0.0)
    } else {
        0.0
    };
    let effective_ms = duration_ms - tool_execution_ms;
    if effective_ms <= 0.0 {
        return None;
    }

    let tps = input.output_tokens as f64 / (effective_ms / 1000.0);
    let time_to_first_token_ms = unit
        .normalize(input.first_token_at)
        .map(|first| (first - created_at).max(0.0));

    Some(TurnMetrics {
        tps: round2(tps),
        time_to_first_token_ms,
    })
}

/// Round half away from zero to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
