//! # a3s-tps
//!
//! Turn-level tokens-per-second (TPS) and time-to-first-token (TTFT) counter
//! for A3S assistant sessions.
//!
//! ## Overview
//!
//! `a3s-tps` listens to a host's message lifecycle notifications, tracks
//! when generation fragments stream in, and when an assistant turn
//! finishes it computes the turn's generation rate with tool execution
//! time taken out. The result is posted back into the session as a
//! message that neither triggers a reply nor enters the assistant's
//! context.
//!
//! ## Quick Start
//!
//! ```rust
//! use a3s_tps::{CounterConfig, MemoryHost, TpsCounter};
//! use std::sync::Arc;
//!
//! # async fn example() -> a3s_tps::Result<()> {
//! let host = Arc::new(MemoryHost::new());
//! let counter = TpsCounter::new(host.clone(), CounterConfig::default())?;
//!
//! let (_tx, mut events) = MemoryHost::channel(64);
//! counter.run(&mut events).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **StreamTracker** — live per-message window of first/last fragment times
//! - **collect_turn_input** — merges history and live windows into one turn
//! - **calculate_tps** — pure TPS/TTFT computation
//! - **TpsCounter** — notification handler with at-most-once reporting
//! - **SessionHost** / **EventStream** traits — the host collaborator

pub mod aggregate;
pub mod calculator;
pub mod config;
pub mod counter;
pub mod error;
pub mod host;
pub mod interval;
pub mod report;
pub mod timestamp;
pub mod tracker;
pub mod types;

// Re-export core types
pub use aggregate::{collect_turn_input, select_turn_messages};
pub use calculator::{calculate_tps, TurnInput, TurnMetrics};
pub use config::CounterConfig;
pub use counter::{HandleOutcome, SkipReason, TpsCounter};
pub use error::{Result, TpsError};
pub use host::{EventStream, SessionHost, StreamEvents};
pub use interval::{merge_ranges, merged_duration_ms, TimeRange};
pub use report::{format_report, ReportMessage, TurnReport};
pub use timestamp::TimestampUnit;
pub use tracker::{StreamTracker, StreamWindow};
pub use types::{
    HostEvent, MessageInfo, MessageTime, Part, PartTime, Role, SessionMessage, StreamPart,
    TokenUsage, ToolPart, ToolState, ToolStatus,
};

// Re-export the in-memory host for convenience
pub use host::memory::{MemoryEventStream, MemoryHost, PostedReport};
