//! Tokens-per-second counter
//!
//! `TpsCounter` is the handler entry point. It owns the live stream
//! windows and the reported-message guard for one host, reacts to each
//! lifecycle notification, and posts a report when an assistant turn
//! completes. Failures never escape `handle`: at worst a turn goes
//! unreported.

use crate::aggregate::{collect_turn_input, select_turn_messages, turn_message_ids};
use crate::calculator::calculate_tps;
use crate::config::CounterConfig;
use crate::error::Result;
use crate::host::{EventStream, SessionHost};
use crate::report::{format_report, ReportMessage, TurnReport};
use crate::tracker::{StreamTracker, StreamWindow};
use crate::types::{HostEvent, MessageInfo, Part};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Why a completed turn produced no report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// History held no assistant message for the turn
    NoTurnMessages,
    /// No usable creation time across the turn
    NotReportable,
    /// Zero tokens, no completion reference, or no generation time left
    InsufficientData,
}

/// What handling one notification did
#[derive(Debug, Clone, PartialEq)]
pub enum HandleOutcome {
    /// A generation fragment widened a stream window
    Tracked,
    /// A removed message's window and guard entry were purged
    Released,
    /// Nothing relevant to the counter
    Ignored,
    /// The message was already reported or a report is in flight
    Duplicate,
    /// The turn completed but no metric could be computed
    Skipped(SkipReason),
    /// A report was dispatched
    Reported(TurnReport),
    /// The host failed; the guard was rolled back
    Failed(String),
}

/// Turn-level TPS/TTFT counter bound to one host
pub struct TpsCounter {
    host: Arc<dyn SessionHost>,
    config: CounterConfig,

    /// Live stream windows (message_id → window)
    tracker: RwLock<StreamTracker>,

    /// Messages with a report dispatched or in flight
    reported: Mutex<HashSet<String>>,
}

impl TpsCounter {
    /// Create a counter, validating the configuration
    pub fn new(host: Arc<dyn SessionHost>, config: CounterConfig) -> Result<Self> {
        config.validate()?;
        let tracker = StreamTracker::new(config.timestamp_unit);
        Ok(Self {
            host,
            config,
            tracker: RwLock::new(tracker),
            reported: Mutex::new(HashSet::new()),
        })
    }

    /// Create a counter with the default configuration
    pub fn with_defaults(host: Arc<dyn SessionHost>) -> Self {
        Self {
            host,
            config: CounterConfig::default(),
            tracker: RwLock::new(StreamTracker::default()),
            reported: Mutex::new(HashSet::new()),
        }
    }

    /// Handle notifications until the feed ends
    ///
    /// Each notification is handled to completion before the next is
    /// read. Only feed errors are returned.
    pub async fn run<S>(&self, events: &mut S) -> Result<()>
    where
        S: EventStream + ?Sized,
    {
        tracing::debug!(
            host = %self.host.name(),
            unit = %self.config.timestamp_unit,
            "TPS counter started"
        );

        while let Some(event) = events.next().await? {
            let kind = event.kind().to_string();
            let outcome = self.handle(event).await;
            tracing::trace!(kind = %kind, outcome = ?outcome, "Notification handled");
        }

        tracing::debug!(host = %self.host.name(), "Event feed ended");
        Ok(())
    }

    /// Handle one host notification
    pub async fn handle(&self, event: HostEvent) -> HandleOutcome {
        match event {
            HostEvent::PartUpdated { part } => self.track_part(&part).await,
            HostEvent::MessageRemoved { message_id, .. } => {
                self.reported.lock().await.remove(&message_id);
                self.tracker.write().await.release([&message_id]);
                HandleOutcome::Released
            }
            HostEvent::MessageUpdated { info } => self.finalize(info).await,
            HostEvent::Unknown { .. } => HandleOutcome::Ignored,
        }
    }

    async fn track_part(&self, part: &Part) -> HandleOutcome {
        if self.tracker.write().await.record_part(part) {
            HandleOutcome::Tracked
        } else {
            HandleOutcome::Ignored
        }
    }

    async fn finalize(&self, info: MessageInfo) -> HandleOutcome {
        if !info.is_terminal_assistant() {
            return HandleOutcome::Ignored;
        }

        if !self.reported.lock().await.insert(info.id.clone()) {
            tracing::debug!(message_id = %info.id, "Turn already reported");
            return HandleOutcome::Duplicate;
        }

        let outcome = match self.report_turn(&info).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(
                    message_id = %info.id,
                    session_id = %info.session_id,
                    host = %self.host.name(),
                    error = %e,
                    "Failed to report turn metrics"
                );
                HandleOutcome::Failed(e.to_string())
            }
        };

        if !matches!(outcome, HandleOutcome::Reported(_)) {
            self.reported.lock().await.remove(&info.id);
        }
        outcome
    }

    async fn report_turn(&self, info: &MessageInfo) -> Result<HandleOutcome> {
        let delay = self.config.settle_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let history = self
            .host
            .messages(&info.session_id, self.config.history_limit)
            .await?;

        let turn = select_turn_messages(&history, info.parent_id.as_deref());
        if turn.is_empty() {
            tracing::debug!(message_id = %info.id, "No assistant messages for turn");
            return Ok(HandleOutcome::Skipped(SkipReason::NoTurnMessages));
        }
        let message_ids = turn_message_ids(&turn);

        let input = {
            let tracker = self.tracker.read().await;
            collect_turn_input(&turn, info.time.completed, &tracker)
        };
        let Some(input) = input else {
            tracing::debug!(message_id = %info.id, "Turn has no creation time");
            return Ok(HandleOutcome::Skipped(SkipReason::NotReportable));
        };

        let Some(metrics) = calculate_tps(&input) else {
            tracing::debug!(
                message_id = %info.id,
                output_tokens = input.output_tokens,
                "Insufficient data for turn metrics"
            );
            return Ok(HandleOutcome::Skipped(SkipReason::InsufficientData));
        };

        let text = format_report(&self.config.label, &metrics);
        self.host
            .post_report(
                &info.session_id,
                ReportMessage::new(text.clone(), self.config.source.clone()),
            )
            .await?;

        self.tracker.write().await.release(&message_ids);

        tracing::info!(
            message_id = %info.id,
            session_id = %info.session_id,
            messages = message_ids.len(),
            tps = metrics.tps,
            ttft_ms = ?metrics.time_to_first_token_ms,
            "Turn metrics reported"
        );

        Ok(HandleOutcome::Reported(TurnReport {
            session_id: info.session_id.clone(),
            message_id: info.id.clone(),
            turn_message_ids: message_ids,
            metrics,
            text,
        }))
    }

    /// Current stream window of a message
    pub async fn window_for(&self, message_id: &str) -> Option<StreamWindow> {
        self.tracker.read().await.window_for(message_id)
    }

    /// Number of messages with a live stream window
    pub async fn tracked_windows(&self) -> usize {
        self.tracker.read().await.len()
    }

    /// Whether a report for this message was dispatched or is in flight
    pub async fn is_reported(&self, message_id: &str) -> bool {
        self.reported.lock().await.contains(message_id)
    }

    pub fn config(&self) -> &CounterConfig {
        &self.config
    }

    /// Get a reference to the underlying host
    pub fn host(&self) -> &dyn SessionHost {
        self.host.as_ref()
    }
}
