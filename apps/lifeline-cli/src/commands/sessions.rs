//! Session management commands.

use crate::output::{self, OutputFormat};
use anyhow::Result;
use lifeline_state::ClientStore;

/// List sessions.
pub async fn sessions_list(store: &ClientStore, format: &OutputFormat) -> Result<()> {
    store.refresh_sessions().await?;
    output::print_sessions(&store.sessions(), store.current_session_id(), format);
    Ok(())
}

/// Create a session.
pub async fn sessions_new(store: &ClientStore, format: &OutputFormat) -> Result<()> {
    let Some(id) = store.create_session().await else {
        anyhow::bail!("Failed to create session");
    };

    match format {
        OutputFormat::Text => println!("Created session {}", id),
        OutputFormat::Json => output::print_json(&serde_json::json!({ "id": id })),
    }
    Ok(())
}

/// Delete a session.
pub async fn sessions_delete(store: &ClientStore, id: i64, format: &OutputFormat) -> Result<()> {
    store.delete_session(id).await?;
    output::print_success(&format!("Deleted session {}", id), format);
    Ok(())
}
