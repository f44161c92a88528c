//! Chat socket wire frames.
//!
//! The client sends exactly one frame shape, `{"type":"user","content":...}`.
//! The server emits `{"type", "content", "timestamp"}` frames where `type` is
//! `assistant`, `error`, or the status-only `thinking` signal.

use crate::{ChannelError, ChannelResult, MessageKind};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Frame sent from the client to the chat server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundFrame {
    #[serde(rename = "type")]
    pub frame_type: String,
    pub content: String,
}

impl OutboundFrame {
    /// A user chat message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            frame_type: MessageKind::User.as_str().to_string(),
            content: content.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Frame received from the chat server. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InboundFrame {
    #[serde(rename = "type")]
    pub frame_type: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// What an inbound frame means for the channel.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameKind {
    /// Append a visible message to the transcript.
    Visible {
        kind: MessageKind,
        content: String,
        timestamp: Option<DateTime<Utc>>,
    },
    /// The server is composing a reply; nothing is appended.
    ThinkingStatus,
}

impl InboundFrame {
    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Classify by declared type.
    ///
    /// Returns [`ChannelError::Protocol`] for frames the client cannot place:
    /// unknown types, user echoes, and assistant frames without content.
    pub fn classify(&self) -> ChannelResult<FrameKind> {
        let timestamp = self.timestamp.as_deref().and_then(parse_timestamp);

        match self.frame_type.as_str() {
            "assistant" => match &self.content {
                Some(content) => Ok(FrameKind::Visible {
                    kind: MessageKind::Assistant,
                    content: content.clone(),
                    timestamp,
                }),
                None => Err(ChannelError::Protocol(
                    "assistant frame without content".to_string(),
                )),
            },
            "error" => Ok(FrameKind::Visible {
                kind: MessageKind::Error,
                content: self
                    .content
                    .clone()
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or_else(|| "Unknown error".to_string()),
                timestamp,
            }),
            "thinking" => Ok(FrameKind::ThinkingStatus),
            "user" => Err(ChannelError::Protocol(
                "server echoed a user frame".to_string(),
            )),
            other => Err(ChannelError::Protocol(format!(
                "unknown frame type {other:?}"
            ))),
        }
    }
}

/// Accept RFC 3339, or a naive ISO 8601 timestamp interpreted as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_user_frame_shape() {
        let json = OutboundFrame::user("Log: started a new project")
            .to_json()
            .unwrap();
        assert_eq!(
            json,
            r#"{"type":"user","content":"Log: started a new project"}"#
        );
    }

    #[test]
    fn test_assistant_frame_classifies_as_visible() {
        let frame = InboundFrame::from_json(
            r#"{"type":"assistant","content":"Noted.","timestamp":"2024-05-01T12:30:00Z"}"#,
        )
        .unwrap();

        match frame.classify().unwrap() {
            FrameKind::Visible {
                kind,
                content,
                timestamp,
            } => {
                assert_eq!(kind, MessageKind::Assistant);
                assert_eq!(content, "Noted.");
                let ts = timestamp.unwrap();
                assert_eq!(ts.year(), 2024);
                assert_eq!(ts.hour(), 12);
            }
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn test_naive_timestamp_is_utc() {
        let frame = InboundFrame::from_json(
            r#"{"type":"assistant","content":"x","timestamp":"2024-05-01T08:15:30.123456"}"#,
        )
        .unwrap();
        let FrameKind::Visible { timestamp, .. } = frame.classify().unwrap() else {
            panic!("expected visible frame");
        };
        assert_eq!(timestamp.unwrap().minute(), 15);
    }

    #[test]
    fn test_unparseable_timestamp_is_dropped_not_fatal() {
        let frame =
            InboundFrame::from_json(r#"{"type":"assistant","content":"x","timestamp":"soon"}"#)
                .unwrap();
        let FrameKind::Visible { timestamp, .. } = frame.classify().unwrap() else {
            panic!("expected visible frame");
        };
        assert!(timestamp.is_none());
    }

    #[test]
    fn test_thinking_frame_is_status_only() {
        let frame = InboundFrame::from_json(r#"{"type":"thinking"}"#).unwrap();
        assert_eq!(frame.classify().unwrap(), FrameKind::ThinkingStatus);
    }

    #[test]
    fn test_error_frame_without_content_gets_placeholder() {
        let frame = InboundFrame::from_json(r#"{"type":"error"}"#).unwrap();
        let FrameKind::Visible { kind, content, .. } = frame.classify().unwrap() else {
            panic!("expected visible frame");
        };
        assert_eq!(kind, MessageKind::Error);
        assert_eq!(content, "Unknown error");
    }

    #[test]
    fn test_anomalies() {
        for json in [
            r#"{"type":"assistant"}"#,
            r#"{"type":"user","content":"echo"}"#,
            r#"{"type":"presence","content":"x"}"#,
        ] {
            let frame = InboundFrame::from_json(json).unwrap();
            assert!(
                matches!(frame.classify(), Err(ChannelError::Protocol(_))),
                "expected anomaly for {json}"
            );
        }
    }

    #[test]
    fn test_missing_type_fails_to_parse() {
        assert!(InboundFrame::from_json(r#"{"content":"x"}"#).is_err());
        assert!(InboundFrame::from_json("not json").is_err());
    }
}
