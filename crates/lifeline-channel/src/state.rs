//! Protocol state of the chat channel, free of any I/O.
//!
//! [`ChatState`] owns the transcript, the `thinking` flag, and the connection
//! machine. [`crate::ChatChannel`] drives it from socket events; tests drive it
//! directly.

use crate::frames::{FrameKind, InboundFrame, OutboundFrame};
use crate::fsm::{ConnectionInput, ConnectionMachine, ConnectionState};
use crate::{ChannelError, ChannelResult, Message, MessageKind, Transcript};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, warn};

/// Text of the error message appended when a turn times out.
pub const THINKING_TIMEOUT_MESSAGE: &str = "Timed out waiting for a response";

/// Text of the error message appended when the channel stops mid-turn.
pub const CONNECTION_LOST_MESSAGE: &str = "Connection lost before a response arrived";

/// Result of applying one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// A visible message was appended.
    Appended(Message),
    /// A status frame updated `thinking`; nothing was appended.
    StatusOnly,
    /// The frame was malformed or unexpected and was ignored.
    Dropped(String),
}

/// Transcript, thinking flag, and connection status.
pub struct ChatState {
    transcript: Transcript,
    thinking_since: Option<DateTime<Utc>>,
    machine: ConnectionMachine,
}

impl std::fmt::Debug for ChatState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatState")
            .field("messages", &self.transcript.len())
            .field("thinking_since", &self.thinking_since)
            .field("connection", &self.connection_state())
            .finish()
    }
}

impl Default for ChatState {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatState {
    pub fn new() -> Self {
        Self {
            transcript: Transcript::new(),
            thinking_since: None,
            machine: ConnectionMachine::new(),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_thinking(&self) -> bool {
        self.thinking_since.is_some()
    }

    pub fn connection_state(&self) -> ConnectionState {
        ConnectionState::from(self.machine.state())
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state().is_connected()
    }

    fn transition(&mut self, input: ConnectionInput) -> ConnectionState {
        let from = self.connection_state();
        if self.machine.consume(&input).is_err() {
            debug!(?from, "Ignoring impossible connection transition");
        }
        self.connection_state()
    }

    /// Disconnected → Connecting.
    pub fn begin_connect(&mut self) -> ConnectionState {
        self.transition(ConnectionInput::Connect)
    }

    /// Connecting → Connected.
    pub fn mark_open(&mut self) -> ConnectionState {
        self.transition(ConnectionInput::Opened)
    }

    /// Connecting → Disconnected.
    pub fn mark_failed(&mut self) -> ConnectionState {
        self.transition(ConnectionInput::Failed)
    }

    /// Connected → Disconnected. The transcript is kept.
    pub fn mark_dropped(&mut self) -> ConnectionState {
        self.transition(ConnectionInput::Dropped)
    }

    /// Any state → Disconnected, for an explicit teardown.
    pub fn mark_shutdown(&mut self) -> ConnectionState {
        self.transition(ConnectionInput::Shutdown)
    }

    /// Start a user turn.
    ///
    /// Appends the user message and sets `thinking`, returning the frame to
    /// transmit. While not connected nothing is appended and
    /// [`ChannelError::NotConnected`] is returned.
    pub fn begin_send(
        &mut self,
        text: &str,
        now: DateTime<Utc>,
    ) -> ChannelResult<(Message, OutboundFrame)> {
        if !self.is_connected() {
            return Err(ChannelError::NotConnected);
        }
        if text.trim().is_empty() {
            return Err(ChannelError::EmptyMessage);
        }

        if let Some(since) = self.thinking_since.take() {
            warn!(
                thinking_since = %since,
                "Previous turn never resolved; resetting thinking before send"
            );
        }

        let message = self.transcript.push(MessageKind::User, text, now);
        self.thinking_since = Some(now);
        Ok((message, OutboundFrame::user(text)))
    }

    /// Clear `thinking` after a send that never reached the socket.
    pub fn abort_turn(&mut self) {
        self.thinking_since = None;
    }

    /// Apply one raw text frame from the socket.
    pub fn apply_text(&mut self, raw: &str, now: DateTime<Utc>) -> FrameOutcome {
        let frame = match InboundFrame::from_json(raw) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Dropping malformed chat frame");
                return FrameOutcome::Dropped(e.to_string());
            }
        };
        self.apply_frame(&frame, now)
    }

    /// Apply one parsed frame.
    pub fn apply_frame(&mut self, frame: &InboundFrame, now: DateTime<Utc>) -> FrameOutcome {
        match frame.classify() {
            Ok(FrameKind::ThinkingStatus) => {
                if self.thinking_since.is_none() {
                    self.thinking_since = Some(now);
                }
                FrameOutcome::StatusOnly
            }
            Ok(FrameKind::Visible {
                kind,
                content,
                timestamp,
            }) => {
                let message = self
                    .transcript
                    .push(kind, content, timestamp.unwrap_or(now));
                if kind.is_terminal() {
                    self.thinking_since = None;
                }
                FrameOutcome::Appended(message)
            }
            Err(e) => {
                warn!(error = %e, frame_type = %frame.frame_type, "Dropping chat frame");
                FrameOutcome::Dropped(e.to_string())
            }
        }
    }

    /// Give up on a turn that has been thinking for at least `timeout`.
    ///
    /// Clears `thinking` and appends a visible error message, which is
    /// returned. Returns `None` when there is nothing to expire.
    pub fn expire_thinking(&mut self, now: DateTime<Utc>, timeout: Duration) -> Option<Message> {
        let since = self.thinking_since?;
        let elapsed = now.signed_duration_since(since).to_std().unwrap_or_default();
        if elapsed < timeout {
            return None;
        }

        self.thinking_since = None;
        warn!(elapsed_ms = elapsed.as_millis() as u64, "Assistant reply timed out");
        Some(
            self.transcript
                .push(MessageKind::Error, THINKING_TIMEOUT_MESSAGE, now),
        )
    }

    /// Fail the open turn, if any, with a visible error message.
    ///
    /// Used when no reply can arrive any more, e.g. after reconnection gave up.
    pub fn end_turn(&mut self, now: DateTime<Utc>, reason: &str) -> Option<Message> {
        let since = self.thinking_since.take()?;
        warn!(thinking_since = %since, reason, "Ending unresolved turn");
        Some(self.transcript.push(MessageKind::Error, reason, now))
    }

    /// Empty the transcript for a different conversation.
    pub fn clear_transcript(&mut self) {
        self.transcript.clear();
        self.thinking_since = None;
    }
}
