//! In-memory host for testing and single-process use
//!
//! Holds session histories in memory, records every posted report, and
//! can be switched into failure modes to exercise the counter's rollback
//! paths. Events are fed through a tokio channel.

use super::{SessionHost, StreamEvents};
use crate::error::{Result, TpsError};
use crate::report::ReportMessage;
use crate::types::{HostEvent, SessionMessage};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio_stream::wrappers::ReceiverStream;

/// Event stream handed out by [`MemoryHost::channel`]
pub type MemoryEventStream = StreamEvents<ReceiverStream<HostEvent>>;

/// A report the host accepted
#[derive(Debug, Clone)]
pub struct PostedReport {
    /// Host-assigned message id (msg-<uuid>)
    pub id: String,
    pub session_id: String,
    pub report: ReportMessage,
    pub posted_at: DateTime<Utc>,
}

/// In-memory [`SessionHost`]
#[derive(Default)]
pub struct MemoryHost {
    sessions: Arc<RwLock<HashMap<String, Vec<SessionMessage>>>>,
    reports: Arc<RwLock<Vec<PostedReport>>>,
    fail_fetch: AtomicBool,
    fail_dispatch: AtomicBool,
    fetches: AtomicUsize,
    dispatch_delay: Option<Duration>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every `post_report` call
    pub fn with_dispatch_delay(mut self, delay: Duration) -> Self {
        self.dispatch_delay = Some(delay);
        self
    }

    /// Create an event channel; send notifications through the sender
    pub fn channel(buffer: usize) -> (mpsc::Sender<HostEvent>, MemoryEventStream) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, StreamEvents::new(ReceiverStream::new(rx)))
    }

    /// Insert a message, replacing any message with the same id
    pub async fn upsert_message(&self, message: SessionMessage) {
        let mut sessions = self.sessions.write().await;
        let history = sessions.entry(message.info.session_id.clone()).or_default();
        match history.iter_mut().find(|m| m.info.id == message.info.id) {
            Some(existing) => *existing = message,
            None => history.push(message),
        }
    }

    /// Remove a message from a session's history
    pub async fn remove_message(&self, session_id: &str, message_id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        let Some(history) = sessions.get_mut(session_id) else {
            return false;
        };
        let before = history.len();
        history.retain(|m| m.info.id != message_id);
        history.len() != before
    }

    /// Make subsequent history fetches fail
    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent report dispatches fail
    pub fn set_fail_dispatch(&self, fail: bool) {
        self.fail_dispatch.store(fail, Ordering::SeqCst);
    }

    /// All accepted reports, oldest first
    pub async fn reports(&self) -> Vec<PostedReport> {
        self.reports.read().await.clone()
    }

    /// Number of history fetches attempted
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionHost for MemoryHost {
    async fn messages(&self, session_id: &str, limit: usize) -> Result<Vec<SessionMessage>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(TpsError::Fetch {
                session_id: session_id.to_string(),
                reason: "history unavailable".to_string(),
            });
        }

        let sessions = self.sessions.read().await;
        let history = sessions
            .get(session_id)
            .ok_or_else(|| TpsError::NotFound(format!("Session not found: {}", session_id)))?;

        let skip = history.len().saturating_sub(limit);
        Ok(history.iter().skip(skip).cloned().collect())
    }

    async fn post_report(&self, session_id: &str, report: ReportMessage) -> Result<()> {
        if let Some(delay) = self.dispatch_delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_dispatch.load(Ordering::SeqCst) {
            return Err(TpsError::Dispatch {
                session_id: session_id.to_string(),
                reason: "session rejected the report".to_string(),
            });
        }

        let posted = PostedReport {
            id: format!("msg-{}", uuid::Uuid::new_v4()),
            session_id: session_id.to_string(),
            report,
            posted_at: Utc::now(),
        };

        tracing::debug!(
            id = %posted.id,
            session_id = %session_id,
            "Report stored"
        );

        self.reports.write().await.push(posted);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
