//! Host event and message types
//!
//! All types use camelCase JSON serialization. Identifier fields also
//! accept the host's `sessionID` / `messageID` / `parentID` / `callID`
//! spelling. Timestamps are kept raw (`f64`) and normalized to
//! milliseconds by [`TimestampUnit`](crate::timestamp::TimestampUnit)
//! where they are used.

use serde::{Deserialize, Serialize};

/// Finish reason that marks the last assistant message of a turn
pub const TERMINAL_FINISH: &str = "stop";

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    /// Any role this crate does not know about
    #[serde(other)]
    Other,
}

/// Message lifecycle timestamps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageTime {
    /// When the message was created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<f64>,

    /// When the message reached its terminal state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<f64>,
}

/// Token usage reported for one assistant message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    #[serde(default)]
    pub input: u64,
    #[serde(default)]
    pub output: u64,
    #[serde(default)]
    pub reasoning: u64,
}

impl TokenUsage {
    /// Tokens the model generated: output plus reasoning
    pub fn generated(&self) -> u64 {
        self.output.saturating_add(self.reasoning)
    }
}

/// Message metadata as carried by `message.updated` and the history query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageInfo {
    pub id: String,

    #[serde(alias = "sessionID")]
    pub session_id: String,

    /// The user message this message answers (assistant messages only)
    #[serde(default, alias = "parentID", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    pub role: Role,

    /// Finish reason (e.g. "stop", "tool-calls"); absent while generating
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish: Option<String>,

    #[serde(default)]
    pub time: MessageTime,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<TokenUsage>,
}

impl MessageInfo {
    /// Whether this is an assistant message that finished its turn
    pub fn is_terminal_assistant(&self) -> bool {
        self.role == Role::Assistant
            && self.finish.as_deref() == Some(TERMINAL_FINISH)
            && self.time.completed.is_some()
    }

    /// Generated tokens, zero when the host reported none
    pub fn generated_tokens(&self) -> u64 {
        self.tokens.map(|t| t.generated()).unwrap_or(0)
    }
}

/// Start/end timestamps of a part
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PartTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
}

/// A text or reasoning fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamPart {
    #[serde(default)]
    pub id: String,

    #[serde(alias = "messageID")]
    pub message_id: String,

    #[serde(default)]
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<PartTime>,
}

/// Tool invocation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Pending,
    Running,
    Completed,
    Error,
    #[serde(other)]
    Other,
}

impl ToolStatus {
    /// Whether the tool call has finished, successfully or not
    pub fn is_finished(self) -> bool {
        matches!(self, ToolStatus::Completed | ToolStatus::Error)
    }
}

/// Tool invocation state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolState {
    pub status: ToolStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<PartTime>,
}

/// A tool call part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolPart {
    #[serde(default)]
    pub id: String,

    #[serde(alias = "messageID")]
    pub message_id: String,

    #[serde(alias = "callID")]
    pub call_id: String,

    #[serde(default)]
    pub tool: String,

    pub state: ToolState,
}

impl ToolPart {
    /// Busy window `(start, end)` of a finished call, raw host units
    pub fn busy_window(&self) -> Option<(f64, f64)> {
        if !self.state.status.is_finished() {
            return None;
        }
        let time = self.state.time?;
        Some((time.start?, time.end?))
    }
}

/// One constituent part of a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Part {
    Text(StreamPart),
    Reasoning(StreamPart),
    Tool(ToolPart),
    /// Files, patches, step markers and other kinds without timing relevance
    #[serde(other)]
    Other,
}

impl Part {
    /// The generation fragment, if this is a text or reasoning part
    pub fn as_stream(&self) -> Option<&StreamPart> {
        match self {
            Part::Text(part) | Part::Reasoning(part) => Some(part),
            Part::Tool(_) | Part::Other => None,
        }
    }

    /// Owning message id, if the part kind carries one
    pub fn message_id(&self) -> Option<&str> {
        match self {
            Part::Text(part) | Part::Reasoning(part) => Some(&part.message_id),
            Part::Tool(part) => Some(&part.message_id),
            Part::Other => None,
        }
    }
}

/// A message with its parts, as returned by the history query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMessage {
    pub info: MessageInfo,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Lifecycle notification delivered by the host event feed
///
/// The wire form is `{"type": "...", "properties": {...}}`. Unknown
/// types map to [`HostEvent::Unknown`] and are ignored by the counter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawHostEvent")]
pub enum HostEvent {
    /// `message.part.updated`
    PartUpdated { part: Part },
    /// `message.updated`
    MessageUpdated { info: MessageInfo },
    /// `message.removed`
    MessageRemoved {
        session_id: String,
        message_id: String,
    },
    /// Any other notification type
    Unknown { kind: String },
}

impl HostEvent {
    /// Wire name of the notification type
    pub fn kind(&self) -> &str {
        match self {
            HostEvent::PartUpdated { .. } => "message.part.updated",
            HostEvent::MessageUpdated { .. } => "message.updated",
            HostEvent::MessageRemoved { .. } => "message.removed",
            HostEvent::Unknown { kind } => kind.as_str(),
        }
    }
}

#[derive(Deserialize)]
struct RawHostEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    properties: serde_json::Value,
}

#[derive(Deserialize)]
struct PartUpdatedProps {
    part: Part,
}

#[derive(Deserialize)]
struct MessageUpdatedProps {
    info: MessageInfo,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageRemovedProps {
    #[serde(default, alias = "sessionID")]
    session_id: String,
    #[serde(alias = "messageID")]
    message_id: String,
}

impl TryFrom<RawHostEvent> for HostEvent {
    type Error = serde_json::Error;

    fn try_from(raw: RawHostEvent) -> std::result::Result<Self, Self::Error> {
        let event = match raw.kind.as_str() {
            "message.part.updated" => {
                let props: PartUpdatedProps = serde_json::from_value(raw.properties)?;
                HostEvent::PartUpdated { part: props.part }
            }
            "message.updated" => {
                let props: MessageUpdatedProps = serde_json::from_value(raw.properties)?;
                HostEvent::MessageUpdated { info: props.info }
            }
            "message.removed" => {
                let props: MessageRemovedProps = serde_json::from_value(raw.properties)?;
                HostEvent::MessageRemoved {
                    session_id: props.session_id,
                    message_id: props.message_id,
                }
            }
            _ => HostEvent::Unknown { kind: raw.kind },
        };
        Ok(event)
    }
}
