//! Integration tests for the chat channel against a live mock server.
//!
//! - `harness.rs`   - Mock chat server and event helpers
//! - `exchange.rs`  - Send/receive, error frames, malformed frames, timeouts
//! - `lifecycle.rs` - Connect, reconnect, give up, shutdown
