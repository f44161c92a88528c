//! Real-time chat channel for the LifeLine client.
//!
//! This crate provides:
//! - WebSocket connection to the chat endpoint
//! - Automatic reconnection with exponential backoff
//! - The live transcript and the "assistant is thinking" flag
//! - A framework-free [`ChatState`] holding the protocol rules, testable
//!   without any socket

mod client;
mod error;
mod frames;
mod fsm;
mod message;
mod state;

#[cfg(test)]
mod tests;

pub use client::{ChannelConfig, ChannelEvent, ChatChannel};
pub use error::{ChannelError, ChannelResult};
pub use frames::{FrameKind, InboundFrame, OutboundFrame};
pub use fsm::{ConnectionState, ReconnectPolicy};
pub use message::{Message, MessageKind, Transcript};
pub use state::{ChatState, FrameOutcome, CONNECTION_LOST_MESSAGE, THINKING_TIMEOUT_MESSAGE};
