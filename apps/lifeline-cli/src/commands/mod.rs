//! CLI command implementations.

mod chat;
mod prefs;
mod sessions;

pub use chat::chat;
pub use prefs::{onboard, prefs_set, prefs_show, theme};
pub use sessions::{sessions_delete, sessions_list, sessions_new};

use anyhow::Result;
use lifeline_state::ClientStore;

/// Load the store, failing when the backend could not supply preferences.
async fn require_preferences(store: &ClientStore) -> Result<()> {
    store.load().await;
    if store.preferences().is_none() {
        anyhow::bail!("Could not load preferences. Is the LifeLine backend running?");
    }
    Ok(())
}
