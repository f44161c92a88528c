//! Application root: owns the chat channel and the client store.

use anyhow::Result;
use lifeline_channel::{ChannelConfig, ChatChannel, ReconnectPolicy};
use lifeline_config::Config;
use lifeline_state::{ClientStore, HttpBackend, ManualAppearance};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Wires the chat channel and the client store together.
///
/// The two only meet through session identity: selecting or creating a
/// session decides which transcript the channel displays.
pub struct App {
    pub channel: Arc<ChatChannel>,
    pub store: Arc<ClientStore>,
    channel_task: Option<JoinHandle<()>>,
}

impl App {
    pub fn new(channel: ChatChannel, store: ClientStore) -> Self {
        Self {
            channel: Arc::new(channel),
            store: Arc::new(store),
            channel_task: None,
        }
    }

    /// Build from configuration: HTTP backend, terminal appearance, socket settings.
    pub fn from_config(config: &Config) -> Result<Self> {
        let backend = HttpBackend::new(&config.api_base_url()?);
        let appearance = ManualAppearance::detect();
        let store = ClientStore::new(Arc::new(backend), Arc::new(appearance));

        Ok(Self::new(ChatChannel::new(channel_config(config)), store))
    }

    /// Start the chat connection loop once.
    pub fn connect(&mut self) {
        if self.channel_task.is_none() {
            info!(url = %self.channel.config().url, "Starting chat channel");
            self.channel_task = Some(self.channel.start());
        }
    }

    /// Create a session and display it.
    ///
    /// On failure nothing changes: the selection and transcript stay put.
    pub async fn new_chat(&self) -> Option<i64> {
        let id = self.store.create_session().await?;
        self.store.set_current_session(Some(id));
        self.channel.clear_transcript();
        debug!(session_id = id, "Started new chat");
        Some(id)
    }

    /// Select an existing session (or none) and clear the displayed transcript.
    pub fn switch_session(&self, id: Option<i64>) {
        if self.store.current_session_id() == id {
            return;
        }
        self.store.set_current_session(id);
        self.channel.clear_transcript();
    }

    /// Stop the channel and release the OS appearance subscription.
    pub async fn shutdown(&mut self) {
        self.channel.shutdown();
        self.store.shutdown();
        if let Some(task) = self.channel_task.take() {
            if tokio::time::timeout(Duration::from_secs(2), task).await.is_err() {
                debug!("Chat channel task did not stop in time");
            }
        }
    }
}

/// Channel settings derived from the client config.
pub fn channel_config(config: &Config) -> ChannelConfig {
    ChannelConfig {
        url: config.chat_socket_url.clone(),
        heartbeat_interval: Duration::from_secs(config.heartbeat_interval_secs.max(1)),
        reconnect: ReconnectPolicy {
            base_delay: Duration::from_millis(config.reconnect_base_delay_ms),
            max_delay: Duration::from_millis(config.reconnect_max_delay_ms),
            max_attempts: config.max_reconnect_attempts,
        },
        thinking_timeout: config.thinking_timeout(),
        ..Default::default()
    }
}
