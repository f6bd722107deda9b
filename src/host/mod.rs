//! Host collaborator traits
//!
//! The host owns the conversation. The counter consumes its event feed,
//! reads session history from it, and posts reports into it. Hosts
//! (in-memory, RPC clients, etc.) implement these traits so the counter
//! never depends on a transport.

use crate::error::Result;
use crate::report::ReportMessage;
use crate::types::{HostEvent, SessionMessage};
use async_trait::async_trait;
use futures::{Stream, StreamExt};

pub mod memory;

/// Session history and report dispatch
#[async_trait]
pub trait SessionHost: Send + Sync {
    /// Fetch up to `limit` messages of a session, oldest first, with parts
    ///
    /// May lag the live event feed.
    async fn messages(&self, session_id: &str, limit: usize) -> Result<Vec<SessionMessage>>;

    /// Insert a report message into a session
    async fn post_report(&self, session_id: &str, report: ReportMessage) -> Result<()>;

    /// Host name (e.g., "memory", "opencode")
    fn name(&self) -> &str;
}

/// Async feed of host lifecycle notifications
#[async_trait]
pub trait EventStream: Send {
    /// Receive the next notification; `None` when the feed has ended
    async fn next(&mut self) -> Result<Option<HostEvent>>;
}

/// Adapts any `Stream` of notifications into an [`EventStream`]
pub struct StreamEvents<S> {
    inner: S,
}

impl<S> StreamEvents<S>
where
    S: Stream<Item = HostEvent> + Unpin + Send,
{
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S> EventStream for StreamEvents<S>
where
    S: Stream<Item = HostEvent> + Unpin + Send,
{
    async fn next(&mut self) -> Result<Option<HostEvent>> {
        Ok(self.inner.next().await)
    }
}
