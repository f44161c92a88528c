//! Scenario tests for the client state store.
//!
//! - `harness.rs`    - Mock backend, mock HTTP server, event helpers
//! - `loading.rs`    - Startup load, loading gate, onboarding
//! - `sessions.rs`   - Create, select, delete, refresh, overlapping refreshes
//! - `appearance.rs` - Declared theme vs OS signal tracking
//! - `http.rs`       - `HttpBackend` against a live HTTP server

mod appearance;
mod http;
mod loading;
