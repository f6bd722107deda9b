//! Live stream windows per assistant message
//!
//! Text and reasoning fragments arrive piecemeal and out of order. The
//! tracker keeps, for each message, the earliest fragment start and the
//! latest fragment end it has seen. A window only ever widens; it is
//! dropped when its turn is reported or the message is removed.

use crate::timestamp::TimestampUnit;
use crate::types::Part;
use std::collections::HashMap;

/// Earliest/latest generation timestamps seen for one message (milliseconds)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StreamWindow {
    pub first_token_at: Option<f64>,
    pub last_token_at: Option<f64>,
}

impl StreamWindow {
    fn widen(&mut self, start: f64, end: f64) {
        self.first_token_at = min_time(self.first_token_at, Some(start));
        self.last_token_at = max_time(self.last_token_at, Some(end));
    }
}

/// Per-message stream windows, keyed by message id
#[derive(Debug, Default)]
pub struct StreamTracker {
    unit: TimestampUnit,
    windows: HashMap<String, StreamWindow>,
}

impl StreamTracker {
    /// Create a tracker that normalizes raw timestamps with `unit`
    pub fn new(unit: TimestampUnit) -> Self {
        Self {
            unit,
            windows: HashMap::new(),
        }
    }

    /// Widen the window of `message_id` with one fragment
    ///
    /// A missing end marks a zero-width fragment at `start`. Fragments
    /// without a usable start are ignored.
    pub fn record_fragment(&mut self, message_id: &str, start: Option<f64>, end: Option<f64>) {
        let Some(start) = self.unit.normalize(start) else {
            return;
        };
        let end = self.unit.normalize(end).unwrap_or(start);

        self.windows
            .entry(message_id.to_string())
            .or_default()
            .widen(start, end);
    }

    /// Feed a streamed part; only text and reasoning parts count
    ///
    /// Returns true if the part was a generation fragment with a start time.
    pub fn record_part(&mut self, part: &Part) -> bool {
        let Some(stream) = part.as_stream() else {
            return false;
        };
        let Some(time) = stream.time else {
            return false;
        };
        if self.unit.normalize(time.start).is_none() {
            return false;
        }
        self.record_fragment(&stream.message_id, time.start, time.end);
        true
    }

    /// Current window of a message, if any fragment was recorded
    pub fn window_for(&self, message_id: &str) -> Option<StreamWindow> {
        self.windows.get(message_id).copied()
    }

    /// Drop the windows of the given messages
    pub fn release<I, S>(&mut self, message_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in message_ids {
            self.windows.remove(id.as_ref());
        }
    }

    /// Number of messages with a live window
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Unit used to normalize incoming timestamps
    pub fn unit(&self) -> TimestampUnit {
        self.unit
    }
}

/// Smaller of two optional timestamps; `None` never wins
pub(crate) fn min_time(existing: Option<f64>, next: Option<f64>) -> Option<f64> {
    match (existing, next) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Larger of two optional timestamps; `None` never wins
pub(crate) fn max_time(existing: Option<f64>, next: Option<f64>) -> Option<f64> {
    match (existing, next) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, None) => a,
        (None, b) => b,
    }
}
