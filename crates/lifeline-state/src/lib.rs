//! Client state store for the LifeLine client.
//!
//! Mirrors the server-side user preferences and chat session list, and
//! resolves the effective light/dark appearance from the declared theme plus
//! the OS signal. All backend traffic goes through the [`Backend`] seam and
//! all OS appearance notifications through [`AppearanceSource`].

mod appearance;
mod backend;
mod error;
mod store;
mod theme;
mod types;

#[cfg(test)]
mod tests;

pub use appearance::{
    detect_terminal_appearance, parse_colorfgbg, resolve_is_dark, AppearanceSource,
    ManualAppearance,
};
pub use backend::{Backend, HttpBackend};
pub use error::{StateError, StateResult};
pub use store::{ClientStore, StoreEvent};
pub use theme::ThemeWatcher;
pub use types::{
    ChatSession, CreatedSession, OnboardingRequest, PreferencesUpdate, StoreSnapshot, Theme,
    UserPreferences,
};
