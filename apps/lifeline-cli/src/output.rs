//! Output formatting for the CLI.

use clap::ValueEnum;
use lifeline_state::{ChatSession, UserPreferences};
use serde::Serialize;

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print a value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: failed to encode output: {}", e),
    }
}

/// Print a success message.
pub fn print_success(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", message),
        OutputFormat::Json => {
            println!("{}", serde_json::json!({"status": "success", "message": message}));
        }
    }
}

/// Print an error message.
pub fn print_error(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => eprintln!("Error: {}", message),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({"status": "error", "message": message}));
        }
    }
}

/// Print a table row.
pub fn print_row(label: &str, value: &str) {
    println!("  {:<16} {}", format!("{}:", label), value);
}

/// Print a divider line.
pub fn print_divider() {
    println!("{}", "-".repeat(50));
}

/// Print a heading.
pub fn print_heading(text: &str) {
    println!("\n{}", text);
    print_divider();
}

/// Human label for an effective appearance.
pub fn appearance_label(is_dark: bool) -> &'static str {
    if is_dark {
        "dark"
    } else {
        "light"
    }
}

/// Print preferences plus the effective appearance.
pub fn print_preferences(prefs: &UserPreferences, is_dark: bool, format: &OutputFormat) {
    match format {
        OutputFormat::Text => {
            print_heading("Preferences");
            print_row("Name", prefs.name.as_deref().unwrap_or("-"));
            print_row("Theme", prefs.theme.as_str());
            print_row("Appearance", appearance_label(is_dark));
            print_row("Model", &prefs.model);
            print_row("Temperature", &prefs.temperature.to_string());
            print_row("Max tokens", &prefs.max_tokens.to_string());
            print_row("Onboarded", if prefs.onboarded { "yes" } else { "no" });
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "preferences": prefs,
            "is_dark": is_dark,
        })),
    }
}

/// Print the session list, marking the selected one.
pub fn print_sessions(sessions: &[ChatSession], current: Option<i64>, format: &OutputFormat) {
    match format {
        OutputFormat::Text => {
            if sessions.is_empty() {
                println!("No sessions found");
                return;
            }
            println!("  {:<8} {:<36} {:<10} {}", "ID", "Title", "Messages", "Updated");
            println!("{}", "-".repeat(80));
            for session in sessions {
                let marker = if Some(session.id) == current { "*" } else { " " };
                println!(
                    "{} {:<8} {:<36} {:<10} {}",
                    marker,
                    session.id,
                    truncate(&session.title, 36),
                    session.message_count,
                    session.updated_at
                );
            }
        }
        OutputFormat::Json => print_json(&sessions),
    }
}

/// Cut `text` to at most `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer title", 10), "a much ...");
        assert_eq!(truncate("héllo wörld", 8), "héllo...");
    }

    #[test]
    fn test_appearance_label() {
        assert_eq!(appearance_label(true), "dark");
        assert_eq!(appearance_label(false), "light");
    }
}
