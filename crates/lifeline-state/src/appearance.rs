//! OS appearance (dark-mode) signal.

use crate::Theme;
use tokio::sync::watch;
use tracing::debug;

/// Source of the OS-level dark-mode signal.
pub trait AppearanceSource: Send + Sync {
    /// Current OS dark-mode state.
    fn is_dark(&self) -> bool;

    /// Receiver that observes every later change.
    fn subscribe(&self) -> watch::Receiver<bool>;
}

/// Appearance source the host feeds by hand.
///
/// Platform integrations push OS notifications through [`ManualAppearance::set_dark`].
#[derive(Debug)]
pub struct ManualAppearance {
    tx: watch::Sender<bool>,
}

impl ManualAppearance {
    pub fn new(initial_dark: bool) -> Self {
        let (tx, _) = watch::channel(initial_dark);
        Self { tx }
    }

    /// Start from [`detect_terminal_appearance`], defaulting to light.
    pub fn detect() -> Self {
        Self::new(detect_terminal_appearance().unwrap_or(false))
    }

    /// Record a new OS value. Subscribers are woken only on an actual change.
    pub fn set_dark(&self, dark: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == dark {
                false
            } else {
                *current = dark;
                true
            }
        });
        if changed {
            debug!(dark, "OS appearance changed");
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl AppearanceSource for ManualAppearance {
    fn is_dark(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Best-effort terminal appearance: `LIFELINE_APPEARANCE=dark|light`, then `COLORFGBG`.
pub fn detect_terminal_appearance() -> Option<bool> {
    if let Ok(value) = std::env::var("LIFELINE_APPEARANCE") {
        match value.trim().to_ascii_lowercase().as_str() {
            "dark" => return Some(true),
            "light" => return Some(false),
            _ => {}
        }
    }
    std::env::var("COLORFGBG").ok().and_then(|v| parse_colorfgbg(&v))
}

/// Interpret `COLORFGBG` (`fg;bg` or `fg;default;bg`). Backgrounds 0-6 and 8 are dark.
pub fn parse_colorfgbg(value: &str) -> Option<bool> {
    let bg: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
    Some(matches!(bg, 0..=6 | 8))
}

/// Effective appearance for a declared theme.
pub fn resolve_is_dark(declared: Theme, os_dark: bool) -> bool {
    match declared {
        Theme::Light => false,
        Theme::Dark => true,
        Theme::System => os_dark,
    }
}
