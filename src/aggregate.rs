//! Turn aggregation
//!
//! Assembles one [`TurnInput`] from the authoritative message history and
//! the tracker's live stream windows. The history can lag the event feed,
//! so generation timestamps are merged from both sources.

use crate::calculator::TurnInput;
use crate::interval::{merged_duration_ms, TimeRange};
use crate::timestamp::TimestampUnit;
use crate::tracker::{max_time, min_time, StreamTracker};
use crate::types::{Part, Role, SessionMessage};

/// Assistant messages answering the same user message as `parent_id`
///
/// A terminal message without a parent has no turn to belong to.
pub fn select_turn_messages<'a>(
    messages: &'a [SessionMessage],
    parent_id: Option<&str>,
) -> Vec<&'a SessionMessage> {
    let Some(parent_id) = parent_id else {
        return Vec::new();
    };
    messages
        .iter()
        .filter(|m| m.info.role == Role::Assistant)
        .filter(|m| m.info.parent_id.as_deref() == Some(parent_id))
        .collect()
}

/// Build the turn aggregate, or `None` if the turn is not reportable
///
/// `completed_at` is the raw completion time of the message that ended
/// the turn. All timestamps in the result are milliseconds.
pub fn collect_turn_input(
    turn_messages: &[&SessionMessage],
    completed_at: Option<f64>,
    tracker: &StreamTracker,
) -> Option<TurnInput> {
    if turn_messages.is_empty() {
        return None;
    }

    let unit = tracker.unit();
    let mut output_tokens: u64 = 0;
    let mut created_at: Option<f64> = None;
    let mut first_token_at: Option<f64> = None;
    let mut last_token_at: Option<f64> = None;
    let mut tool_ranges: Vec<TimeRange> = Vec::new();

    for message in turn_messages {
        output_tokens = output_tokens.saturating_add(message.info.generated_tokens());
        created_at = min_time(created_at, unit.normalize(message.info.time.created));

        for part in &message.parts {
            match part {
                Part::Text(stream) | Part::Reasoning(stream) => {
                    let Some(time) = stream.time else { continue };
                    let Some(start) = unit.normalize(time.start) else {
                        continue;
                    };
                    let end = unit.normalize(time.end).unwrap_or(start);
                    first_token_at = min_time(first_token_at, Some(start));
                    last_token_at = max_time(last_token_at, Some(end));
                }
                Part::Tool(tool) => {
                    let Some((start, end)) = tool.busy_window() else {
                        continue;
                    };
                    let range = unit
                        .to_millis(start)
                        .zip(unit.to_millis(end))
                        .and_then(|(start, end)| TimeRange::new(start, end));
                    if let Some(range) = range {
                        tool_ranges.push(range);
                    }
                }
                Part::Other => {}
            }
        }

        if let Some(window) = tracker.window_for(&message.info.id) {
            first_token_at = min_time(first_token_at, window.first_token_at);
            last_token_at = max_time(last_token_at, window.last_token_at);
        }
    }

    let created_at = created_at?;

    Some(TurnInput {
        output_tokens,
        created_at,
        completed_at: unit.normalize(completed_at),
        first_token_at,
        last_token_at,
        tool_execution_ms: merged_duration_ms(&tool_ranges),
        unit: TimestampUnit::Millis,
    })
}

/// Ids of the messages in a turn, in history order
pub fn turn_message_ids(turn_messages: &[&SessionMessage]) -> Vec<String> {
    turn_messages.iter().map(|m| m.info.id.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::{calculate_tps, round2};
    use crate::types::{
        MessageInfo, MessageTime, PartTime, StreamPart, TokenUsage, ToolPart, ToolState,
        ToolStatus,
    };

    fn assistant(id: &str, parent: &str, created: f64, output: u64, reasoning: u64) -> SessionMessage {
        SessionMessage {
            info: MessageInfo {
                id: id.to_string(),
                session_id: "ses-1".to_string(),
                parent_id: Some(parent.to_string()),
                role: Role::Assistant,
                finish: Some("stop".to_string()),
                time: MessageTime {
                    created: Some(created),
                    completed: None,
                },
                tokens: Some(TokenUsage {
                    input: 0,
                    output,
                    reasoning,
                }),
            },
            parts: Vec::new(),
        }
    }

    fn user(id: &str) -> SessionMessage {
        SessionMessage {
            info: MessageInfo {
                id: id.to_string(),
                session_id: "ses-1".to_string(),
                parent_id: None,
                role: Role::User,
                finish: None,
                time: MessageTime {
                    created: Some(0.0),
                    completed: None,
                },
                tokens: None,
            },
            parts: Vec::new(),
        }
    }

    fn text(message_id: &str, start: Option<f64>, end: Option<f64>) -> Part {
        Part::Text(StreamPart {
            id: String::new(),
            message_id: message_id.to_string(),
            text: String::new(),
            time: Some(PartTime { start, end }),
        })
    }

    fn reasoning(message_id: &str, start: f64, end: f64) -> Part {
        Part::Reasoning(StreamPart {
            id: String::new(),
            message_id: message_id.to_string(),
            text: String::new(),
            time: Some(PartTime {
                start: Some(start),
                end: Some(end),
            }),
        })
    }

    fn tool(message_id: &str, call_id: &str, status: ToolStatus, start: f64, end: Option<f64>) -> Part {
        Part::Tool(ToolPart {
            id: String::new(),
            message_id: message_id.to_string(),
            call_id: call_id.to_string(),
            tool: "bash".to_string(),
            state: ToolState {
                status,
                time: Some(PartTime {
                    start: Some(start),
                    end,
                }),
            },
        })
    }

    fn millis_tracker() -> StreamTracker {
        StreamTracker::new(TimestampUnit::Millis)
    }

    #[test]
    fn test_select_turn_messages_by_parent() {
        let history = vec![
            user("msg-u1"),
            assistant("msg-a1", "msg-u1", 0.0, 10, 0),
            user("msg-u2"),
            assistant("msg-a2", "msg-u2", 0.0, 10, 0),
            assistant("msg-a3", "msg-u2", 0.0, 10, 0),
        ];

        let turn = select_turn_messages(&history, Some("msg-u2"));
        assert_eq!(turn_message_ids(&turn), vec!["msg-a2", "msg-a3"]);

        assert!(select_turn_messages(&history, None).is_empty());
        assert!(select_turn_messages(&history, Some("msg-none")).is_empty());
    }

    #[test]
    fn test_reference_turn_aggregation() {
        let mut message = assistant("msg-a", "msg-u", 0.0, 50, 10);
        message.parts = vec![
            reasoning("msg-a", 200.0, 400.0),
            tool("msg-a", "call-1", ToolStatus::Completed, 500.0, Some(1000.0)),
            text("msg-a", Some(1100.0), Some(2000.0)),
        ];
        let turn = vec![&message];

        let input = collect_turn_input(&turn, Some(2100.0), &millis_tracker()).unwrap();
        assert_eq!(input.output_tokens, 60);
        assert_eq!(input.created_at, 0.0);
        assert_eq!(input.first_token_at, Some(200.0));
        assert_eq!(input.last_token_at, Some(2000.0));
        assert_eq!(input.completed_at, Some(2100.0));
        assert_eq!(input.tool_execution_ms, 500.0);

        let metrics = calculate_tps(&input).unwrap();
        assert_eq!(metrics.tps, 40.0);
        assert_eq!(metrics.time_to_first_token_ms, Some(200.0));
    }

    #[test]
    fn test_multi_message_turn() {
        let mut first = assistant("msg-a1", "msg-u", 100.0, 20, 0);
        first.parts = vec![
            text("msg-a1", Some(300.0), Some(600.0)),
            tool("msg-a1", "call-1", ToolStatus::Completed, 600.0, Some(1000.0)),
            tool("msg-a1", "call-2", ToolStatus::Error, 700.0, Some(1200.0)),
        ];
        let mut second = assistant("msg-a2", "msg-u", 1200.0, 30, 5);
        second.parts = vec![text("msg-a2", Some(1300.0), Some(2100.0))];
        let turn = vec![&first, &second];

        let input = collect_turn_input(&turn, Some(2200.0), &millis_tracker()).unwrap();
        assert_eq!(input.output_tokens, 55);
        assert_eq!(input.created_at, 100.0);
        assert_eq!(input.first_token_at, Some(300.0));
        assert_eq!(input.last_token_at, Some(2100.0));
        assert_eq!(input.tool_execution_ms, 600.0);
    }

    #[test]
    fn test_live_window_extends_lagging_history() {
        let mut message = assistant("msg-a", "msg-u", 0.0, 40, 0);
        message.parts = vec![text("msg-a", Some(250.0), None)];
        let turn = vec![&message];

        let mut tracker = millis_tracker();
        tracker.record_fragment("msg-a", Some(150.0), Some(300.0));
        tracker.record_fragment("msg-a", Some(900.0), Some(1000.0));

        let input = collect_turn_input(&turn, Some(1500.0), &tracker).unwrap();
        assert_eq!(input.first_token_at, Some(150.0));
        assert_eq!(input.last_token_at, Some(1000.0));
    }

    #[test]
    fn test_unfinished_and_invalid_tools_ignored() {
        let mut message = assistant("msg-a", "msg-u", 0.0, 10, 0);
        message.parts = vec![
            tool("msg-a", "call-1", ToolStatus::Running, 100.0, Some(200.0)),
            tool("msg-a", "call-2", ToolStatus::Completed, 300.0, None),
            tool("msg-a", "call-3", ToolStatus::Completed, 500.0, Some(500.0)),
            tool("msg-a", "call-4", ToolStatus::Completed, 700.0, Some(600.0)),
            tool("msg-a", "call-5", ToolStatus::Pending, 0.0, Some(900.0)),
        ];
        let turn = vec![&message];

        let input = collect_turn_input(&turn, Some(1000.0), &millis_tracker()).unwrap();
        assert_eq!(input.tool_execution_ms, 0.0);
    }

    #[test]
    fn test_overlapping_tools_across_messages() {
        let mut first = assistant("msg-a1", "msg-u", 0.0, 10, 0);
        first.parts = vec![tool("msg-a1", "call-1", ToolStatus::Completed, 0.0, Some(100.0))];
        let mut second = assistant("msg-a2", "msg-u", 0.0, 10, 0);
        second.parts = vec![tool("msg-a2", "call-2", ToolStatus::Completed, 50.0, Some(150.0))];
        let turn = vec![&first, &second];

        let input = collect_turn_input(&turn, Some(1000.0), &millis_tracker()).unwrap();
        assert_eq!(input.tool_execution_ms, 150.0);
    }

    #[test]
    fn test_missing_tokens_contribute_zero() {
        let mut message = assistant("msg-a", "msg-u", 0.0, 0, 0);
        message.info.tokens = None;
        let other = assistant("msg-b", "msg-u", 0.0, 12, 3);
        let turn = vec![&message, &other];

        let input = collect_turn_input(&turn, Some(1000.0), &millis_tracker()).unwrap();
        assert_eq!(input.output_tokens, 15);
    }

    #[test]
    fn test_empty_turn_not_reportable() {
        assert!(collect_turn_input(&[], Some(1000.0), &millis_tracker()).is_none());
    }

    #[test]
    fn test_no_creation_time_not_reportable() {
        let mut message = assistant("msg-a", "msg-u", 0.0, 10, 0);
        message.info.time.created = None;
        let turn = vec![&message];
        assert!(collect_turn_input(&turn, Some(1000.0), &millis_tracker()).is_none());

        message.info.time.created = Some(f64::NAN);
        let turn = vec![&message];
        assert!(collect_turn_input(&turn, Some(1000.0), &millis_tracker()).is_none());
    }

    #[test]
    fn test_mixed_units_normalized_under_auto() {
        let mut message = assistant("msg-a", "msg-u", 1_700_000_000.0, 100, 0);
        message.parts = vec![
            text("msg-a", Some(1_700_000_000_500.0), Some(1_700_000_004_000.0)),
            tool("msg-a", "call-1", ToolStatus::Completed, 1_700_000_001.0, Some(1_700_000_002.0)),
        ];
        let turn = vec![&message];
        let tracker = StreamTracker::new(TimestampUnit::Auto);

        let input = collect_turn_input(&turn, Some(1_700_000_005.0), &tracker).unwrap();
        assert_eq!(input.unit, TimestampUnit::Millis);
        assert_eq!(input.created_at, 1_700_000_000_000.0);
        assert_eq!(input.completed_at, Some(1_700_000_005_000.0));
        assert_eq!(input.tool_execution_ms, 1000.0);

        let metrics = calculate_tps(&input).unwrap();
        assert_eq!(metrics.tps, round2(100.0 / 3.0));
        assert_eq!(metrics.time_to_first_token_ms, Some(500.0));
    }
}
