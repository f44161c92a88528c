//! Preference, theme, and onboarding commands.

use super::require_preferences;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use lifeline_state::{ClientStore, PreferencesUpdate, Theme};

/// Show preferences.
pub async fn prefs_show(store: &ClientStore, format: &OutputFormat) -> Result<()> {
    require_preferences(store).await?;

    if let Some(prefs) = store.preferences() {
        output::print_preferences(&prefs, store.is_dark(), format);
    }
    Ok(())
}

/// Apply a partial preference update.
pub async fn prefs_set(
    store: &ClientStore,
    update: PreferencesUpdate,
    format: &OutputFormat,
) -> Result<()> {
    if update.is_empty() {
        anyhow::bail!("Nothing to update. Pass at least one option (see --help)");
    }
    if let Some(temperature) = update.temperature {
        if !(0.0..=2.0).contains(&temperature) {
            anyhow::bail!("Temperature must be between 0.0 and 2.0");
        }
    }

    require_preferences(store).await?;
    let prefs = store.update_preferences(update).await?;
    output::print_preferences(&prefs, store.is_dark(), format);
    Ok(())
}

/// Change the declared theme and report the effective appearance.
pub async fn theme(store: &ClientStore, theme: Theme, format: &OutputFormat) -> Result<()> {
    require_preferences(store).await?;
    let prefs = store.set_theme(theme).await?;

    let appearance = output::appearance_label(store.is_dark());
    match format {
        OutputFormat::Text => println!("Theme set to {} (appearance: {})", prefs.theme, appearance),
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "theme": prefs.theme,
            "is_dark": store.is_dark(),
        })),
    }
    Ok(())
}

/// Complete first-run onboarding.
pub async fn onboard(
    store: &ClientStore,
    name: &str,
    theme: Theme,
    format: &OutputFormat,
) -> Result<()> {
    require_preferences(store).await?;
    let prefs = store.complete_onboarding(name, theme).await?;

    let greeting = format!("Welcome, {}!", prefs.name.as_deref().unwrap_or(name.trim()));
    output::print_success(&greeting, format);
    Ok(())
}
