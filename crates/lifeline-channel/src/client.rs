//! WebSocket chat channel.

use crate::fsm::{ConnectionState, ReconnectPolicy};
use crate::{
    ChannelError, ChannelResult, ChatState, FrameOutcome, Message, CONNECTION_LOST_MESSAGE,
};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Duration, Instant, MissedTickBehavior};
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tracing::{debug, error, info, warn};

/// Chat channel configuration.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Chat socket URL (e.g., ws://localhost:8000/ws/chat).
    pub url: String,
    /// Interval between keepalive pings.
    pub heartbeat_interval: Duration,
    /// Reconnect backoff.
    pub reconnect: ReconnectPolicy,
    /// How long `thinking` may stay true before the turn is failed.
    pub thinking_timeout: Option<Duration>,
    /// Capacity of the outbound frame queue.
    pub outbound_buffer: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8000/ws/chat".to_string(),
            heartbeat_interval: Duration::from_secs(30),
            reconnect: ReconnectPolicy::default(),
            thinking_timeout: Some(Duration::from_secs(120)),
            outbound_buffer: 100,
        }
    }
}

/// Events emitted by the chat channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// A connection attempt started.
    Connecting,
    /// Connected to the chat server.
    Connected,
    /// Disconnected, with an optional reason.
    Disconnected(Option<String>),
    /// Waiting before the next connection attempt.
    Reconnecting { attempt: u32, delay: Duration },
    /// Reconnect attempts exhausted; the channel stays disconnected.
    GaveUp,
    /// A message was appended to the transcript.
    MessageAppended(Message),
    /// The thinking flag flipped.
    ThinkingChanged(bool),
    /// An inbound frame was ignored.
    FrameDropped(String),
    /// The transcript was emptied.
    TranscriptCleared,
}

/// WebSocket chat channel with automatic reconnection.
///
/// Owns the live transcript. Call [`ChatChannel::start`] once to run the
/// connection loop in the background; everything else is synchronous.
pub struct ChatChannel {
    config: ChannelConfig,
    state: Mutex<ChatState>,
    sender: Mutex<Option<mpsc::Sender<WsMessage>>>,
    event_tx: broadcast::Sender<ChannelEvent>,
    shutdown_tx: watch::Sender<bool>,
    failed_attempts: AtomicU32,
}

impl ChatChannel {
    /// Create a new chat channel with the given configuration.
    pub fn new(config: ChannelConfig) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            config,
            state: Mutex::new(ChatState::new()),
            sender: Mutex::new(None),
            event_tx,
            shutdown_tx,
            failed_attempts: AtomicU32::new(0),
        }
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ChannelConfig::default())
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Subscribe to channel events.
    pub fn subscribe(&self) -> broadcast::Receiver<ChannelEvent> {
        self.event_tx.subscribe()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state.lock().connection_state()
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().is_connected()
    }

    pub fn is_thinking(&self) -> bool {
        self.state.lock().is_thinking()
    }

    /// Snapshot of the full transcript, including `thinking` sentinels.
    pub fn messages(&self) -> Vec<Message> {
        self.state.lock().transcript().messages().to_vec()
    }

    /// Snapshot of the messages the UI renders.
    pub fn visible_messages(&self) -> Vec<Message> {
        self.state.lock().transcript().visible().cloned().collect()
    }

    fn is_shut_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    fn emit(&self, event: ChannelEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Spawn the connection loop and the thinking-timeout watchdog.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let channel = Arc::clone(self);
        tokio::spawn(async move {
            let watchdog = channel.spawn_watchdog();
            channel.run().await;
            if let Some(watchdog) = watchdog {
                watchdog.abort();
            }
        })
    }

    /// Expire stuck turns on a fixed cadence, independent of connection attempts.
    fn spawn_watchdog(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let timeout = self.config.thinking_timeout?;
        let channel = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        Some(tokio::spawn(async move {
            let mut ticker = interval(watchdog_period(timeout));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => channel.check_thinking_timeout(),
                    _ = shutdown_rx.wait_for(|stop| *stop) => break,
                }
            }
        }))
    }

    async fn run(&self) {
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            if self.is_shut_down() {
                break;
            }

            if let Err(e) = self.connect_once(&mut shutdown_rx).await {
                warn!(error = %e, url = %self.config.url, "Chat connection attempt failed");
            }

            if self.is_shut_down() {
                break;
            }

            let failed = self.failed_attempts.fetch_add(1, Ordering::SeqCst);
            if !self.config.reconnect.allows_attempt(failed) {
                warn!(attempts = failed, "Max reconnect attempts reached");
                // No reply can arrive any more.
                self.end_open_turn();
                self.emit(ChannelEvent::GaveUp);
                break;
            }

            let delay = self.config.reconnect.delay_for_attempt(failed);
            info!(attempt = failed + 1, delay_ms = delay.as_millis() as u64, "Scheduling reconnect");
            self.emit(ChannelEvent::Reconnecting {
                attempt: failed + 1,
                delay,
            });

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown_rx.wait_for(|stop| *stop) => break,
            }
        }

        debug!("Chat connection loop finished");
    }

    /// One connection lifetime: connect, pump frames until the socket ends.
    async fn connect_once(&self, shutdown_rx: &mut watch::Receiver<bool>) -> ChannelResult<()> {
        {
            let mut state = self.state.lock();
            if self.is_shut_down() {
                return Ok(());
            }
            state.begin_connect();
        }
        self.emit(ChannelEvent::Connecting);
        info!(url = %self.config.url, "Connecting to chat server");

        let connected = tokio::select! {
            result = connect_async(&self.config.url) => result,
            // shutdown() already moved the machine to Disconnected.
            _ = shutdown_rx.wait_for(|stop| *stop) => return Ok(()),
        };
        let ws_stream = match connected {
            Ok((ws_stream, _)) => ws_stream,
            Err(e) => {
                self.state.lock().mark_failed();
                return Err(ChannelError::from(e));
            }
        };
        let (mut write, mut read) = ws_stream.split();

        let (msg_tx, mut msg_rx) = mpsc::channel::<WsMessage>(self.config.outbound_buffer);

        // A shutdown that raced the handshake wins.
        {
            let mut state = self.state.lock();
            if self.is_shut_down() {
                state.mark_shutdown();
                return Ok(());
            }
            state.mark_open();
            *self.sender.lock() = Some(msg_tx.clone());
        }
        self.failed_attempts.store(0, Ordering::SeqCst);
        info!("Connected to chat server");
        self.emit(ChannelEvent::Connected);

        let mut writer = tokio::spawn(async move {
            while let Some(msg) = msg_rx.recv().await {
                if write.send(msg).await.is_err() {
                    break;
                }
            }
            let _ = write.close().await;
        });

        let period = self.config.heartbeat_interval;
        let mut heartbeat = interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let reason = loop {
            tokio::select! {
                incoming = read.next() => match incoming {
                    Some(Ok(WsMessage::Text(text))) => self.handle_text(&text),
                    Some(Ok(WsMessage::Binary(_))) => {
                        warn!("Dropping binary chat frame");
                        self.emit(ChannelEvent::FrameDropped("binary frame".to_string()));
                    }
                    Some(Ok(WsMessage::Ping(data))) => {
                        let _ = msg_tx.try_send(WsMessage::Pong(data));
                    }
                    Some(Ok(WsMessage::Close(frame))) => {
                        info!("Chat connection closed by server");
                        break frame.map(|f| f.reason.as_str().to_string()).filter(|r| !r.is_empty());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!(error = %e, "WebSocket error");
                        break Some(e.to_string());
                    }
                    None => break None,
                },
                _ = heartbeat.tick() => {
                    if msg_tx.try_send(WsMessage::Ping(Default::default())).is_err() {
                        debug!("Outbound queue full; skipping heartbeat");
                    }
                }
                _ = shutdown_rx.wait_for(|stop| *stop) => {
                    let _ = msg_tx.try_send(WsMessage::Close(None));
                    break None;
                }
            }
        };

        // Dropping every sender lets the writer drain and close the socket.
        drop(msg_tx);
        self.sender.lock().take();
        if tokio::time::timeout(Duration::from_secs(1), &mut writer)
            .await
            .is_err()
        {
            writer.abort();
        }

        if self.is_shut_down() {
            // shutdown() already moved the machine and announced it.
            return Ok(());
        }

        self.state.lock().mark_dropped();
        info!(reason = ?reason, "Disconnected from chat server");
        self.emit(ChannelEvent::Disconnected(reason));
        Ok(())
    }

    fn handle_text(&self, text: &str) {
        let (outcome, was_thinking, is_thinking) = {
            let mut state = self.state.lock();
            let was_thinking = state.is_thinking();
            let outcome = state.apply_text(text, Utc::now());
            (outcome, was_thinking, state.is_thinking())
        };

        match outcome {
            FrameOutcome::Appended(message) => {
                debug!(id = message.id, kind = message.kind.as_str(), "Received message");
                self.emit(ChannelEvent::MessageAppended(message));
            }
            FrameOutcome::StatusOnly => {}
            FrameOutcome::Dropped(reason) => self.emit(ChannelEvent::FrameDropped(reason)),
        }

        if was_thinking != is_thinking {
            self.emit(ChannelEvent::ThinkingChanged(is_thinking));
        }
    }

    fn end_open_turn(&self) {
        let ended = self.state.lock().end_turn(Utc::now(), CONNECTION_LOST_MESSAGE);
        if let Some(message) = ended {
            self.emit(ChannelEvent::MessageAppended(message));
            self.emit(ChannelEvent::ThinkingChanged(false));
        }
    }

    fn check_thinking_timeout(&self) {
        let Some(timeout) = self.config.thinking_timeout else {
            return;
        };
        let expired = self.state.lock().expire_thinking(Utc::now(), timeout);
        if let Some(message) = expired {
            self.emit(ChannelEvent::MessageAppended(message));
            self.emit(ChannelEvent::ThinkingChanged(false));
        }
    }

    /// Send a user message.
    ///
    /// Appends the message to the transcript, queues it for the socket, and
    /// sets `thinking`. Never waits for the round trip. While disconnected
    /// nothing is appended or queued and [`ChannelError::NotConnected`] is
    /// returned.
    pub fn send(&self, text: &str) -> ChannelResult<Message> {
        let sender = self
            .sender
            .lock()
            .clone()
            .ok_or(ChannelError::NotConnected)?;

        let (message, frame, was_thinking) = {
            let mut state = self.state.lock();
            let was_thinking = state.is_thinking();
            let (message, frame) = state.begin_send(text, Utc::now())?;
            (message, frame, was_thinking)
        };
        self.emit(ChannelEvent::MessageAppended(message.clone()));

        let queued = frame
            .to_json()
            .map_err(ChannelError::from)
            .and_then(|json| {
                sender
                    .try_send(WsMessage::Text(json.into()))
                    .map_err(|e| ChannelError::Send(e.to_string()))
            });

        if let Err(e) = queued {
            // The message stays in the transcript; the turn is over.
            self.state.lock().abort_turn();
            warn!(error = %e, id = message.id, "Failed to queue chat message");
            self.emit(ChannelEvent::ThinkingChanged(false));
            return Err(e);
        }

        debug!(id = message.id, "Queued user message");
        if !was_thinking {
            self.emit(ChannelEvent::ThinkingChanged(true));
        }
        Ok(message)
    }

    /// Empty the transcript, e.g. when the selected chat session changes.
    pub fn clear_transcript(&self) {
        let was_thinking = {
            let mut state = self.state.lock();
            let was_thinking = state.is_thinking();
            state.clear_transcript();
            was_thinking
        };
        self.emit(ChannelEvent::TranscriptCleared);
        if was_thinking {
            self.emit(ChannelEvent::ThinkingChanged(false));
        }
    }

    /// Stop the channel for good: close the socket and never reconnect.
    ///
    /// The transcript is kept; an unanswered turn is abandoned.
    pub fn shutdown(&self) {
        let (previous, was_thinking) = {
            let mut state = self.state.lock();
            let previous = state.connection_state();
            let was_thinking = state.is_thinking();
            self.shutdown_tx.send_replace(true);
            state.mark_shutdown();
            state.abort_turn();
            (previous, was_thinking)
        };
        self.sender.lock().take();

        if was_thinking {
            self.emit(ChannelEvent::ThinkingChanged(false));
        }

        if previous != ConnectionState::Disconnected {
            info!("Chat channel shut down");
            self.emit(ChannelEvent::Disconnected(Some(
                "closed by client".to_string(),
            )));
        }
    }
}

impl Drop for ChatChannel {
    fn drop(&mut self) {
        self.shutdown_tx.send_replace(true);
    }
}

/// Timeout check cadence: a quarter of the timeout, kept within 10ms..1s.
fn watchdog_period(timeout: Duration) -> Duration {
    (timeout / 4).clamp(Duration::from_millis(10), Duration::from_secs(1))
}
