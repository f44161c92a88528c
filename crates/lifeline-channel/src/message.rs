//! Transcript messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who (or what) produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    User,
    Assistant,
    /// Status sentinel; never rendered as a bubble.
    Thinking,
    Error,
}

impl MessageKind {
    /// Whether the UI should render this message.
    pub fn is_visible(self) -> bool {
        !matches!(self, MessageKind::Thinking)
    }

    /// Whether this message ends the assistant's turn.
    pub fn is_terminal(self) -> bool {
        matches!(self, MessageKind::Assistant | MessageKind::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::User => "user",
            MessageKind::Assistant => "assistant",
            MessageKind::Thinking => "thinking",
            MessageKind::Error => "error",
        }
    }
}

/// One chat turn in the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Append-only list of messages in arrival order.
///
/// Ids are handed out from a counter that survives [`Transcript::clear`],
/// so an id is never reused within one channel.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
    next_id: u64,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            next_id: 1,
        }
    }

    /// Append a message and return a copy of it.
    pub fn push(
        &mut self,
        kind: MessageKind,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Message {
        let message = Message {
            id: self.next_id,
            kind,
            content: content.into(),
            timestamp,
        };
        self.next_id += 1;
        self.messages.push(message.clone());
        message
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages the UI renders (everything except `thinking` sentinels).
    pub fn visible(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.kind.is_visible())
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Drop every message. Used when the displayed conversation changes.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
