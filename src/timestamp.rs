//! Timestamp unit normalization
//!
//! Hosts report timestamps either in Unix seconds or Unix milliseconds.
//! Every timestamp is normalized to milliseconds on its own before it is
//! compared with or subtracted from another one.

use serde::{Deserialize, Serialize};

/// Values above this are taken to be milliseconds under [`TimestampUnit::Auto`]
pub const MILLIS_THRESHOLD: f64 = 1e11;

/// Unit of the raw timestamps delivered by the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimestampUnit {
    /// Guess per value: anything above 10^11 is milliseconds, the rest seconds
    #[default]
    Auto,
    /// Raw values are milliseconds
    Millis,
    /// Raw values are seconds
    Seconds,
}

impl TimestampUnit {
    /// Convert a raw timestamp to milliseconds
    ///
    /// Returns `None` for non-finite input so callers can drop the datum.
    pub fn to_millis(self, raw: f64) -> Option<f64> {
        if !raw.is_finite() {
            return None;
        }
        let millis = match self {
            TimestampUnit::Millis => raw,
            TimestampUnit::Seconds => raw * 1000.0,
            TimestampUnit::Auto if raw > MILLIS_THRESHOLD => raw,
            TimestampUnit::Auto => raw * 1000.0,
        };
        Some(millis)
    }

    /// Normalize an optional raw timestamp
    pub fn normalize(self, raw: Option<f64>) -> Option<f64> {
        raw.and_then(|value| self.to_millis(value))
    }
}

impl std::fmt::Display for TimestampUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimestampUnit::Auto => write!(f, "auto"),
            TimestampUnit::Millis => write!(f, "millis"),
            TimestampUnit::Seconds => write!(f, "seconds"),
        }
    }
}
