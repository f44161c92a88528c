//! Client state store.

use crate::appearance::{resolve_is_dark, AppearanceSource};
use crate::{
    Backend, ChatSession, OnboardingRequest, PreferencesUpdate, StateError, StateResult,
    StoreSnapshot, Theme, ThemeWatcher, UserPreferences,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Events emitted when store state changes.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    LoadingChanged(bool),
    PreferencesChanged(Option<UserPreferences>),
    SessionsChanged(Vec<ChatSession>),
    CurrentSessionChanged(Option<i64>),
    /// Effective appearance flipped; `true` is dark.
    AppearanceChanged(bool),
}

#[derive(Debug)]
struct StoreState {
    preferences: Option<UserPreferences>,
    sessions: Vec<ChatSession>,
    current_session_id: Option<i64>,
    is_loading: bool,
    is_dark: bool,
    /// Declared theme the appearance was last resolved for.
    resolved_theme: Option<Theme>,
    /// Bumped on every re-resolution; OS callbacks from older epochs are ignored.
    theme_epoch: u64,
}

/// State container for preferences, sessions, and effective appearance.
///
/// Created once at the application root and shared by reference. Every
/// mutation goes through its methods; observers use [`ClientStore::subscribe`].
pub struct ClientStore {
    backend: Arc<dyn Backend>,
    appearance: Arc<dyn AppearanceSource>,
    state: Arc<Mutex<StoreState>>,
    watcher: Mutex<ThemeWatcher>,
    event_tx: broadcast::Sender<StoreEvent>,
}

impl ClientStore {
    pub fn new(backend: Arc<dyn Backend>, appearance: Arc<dyn AppearanceSource>) -> Self {
        let (event_tx, _) = broadcast::channel(64);

        Self {
            backend,
            appearance,
            state: Arc::new(Mutex::new(StoreState {
                preferences: None,
                sessions: Vec::new(),
                current_session_id: None,
                is_loading: true,
                is_dark: false,
                resolved_theme: None,
                theme_epoch: 0,
            })),
            watcher: Mutex::new(ThemeWatcher::new()),
            event_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.event_tx.subscribe()
    }

    fn emit(&self, event: StoreEvent) {
        let _ = self.event_tx.send(event);
    }

    pub fn preferences(&self) -> Option<UserPreferences> {
        self.state.lock().preferences.clone()
    }

    pub fn sessions(&self) -> Vec<ChatSession> {
        self.state.lock().sessions.clone()
    }

    pub fn current_session_id(&self) -> Option<i64> {
        self.state.lock().current_session_id
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().is_loading
    }

    pub fn is_dark(&self) -> bool {
        self.state.lock().is_dark
    }

    /// Whether the OS appearance subscription is live.
    pub fn is_following_os(&self) -> bool {
        self.watcher.lock().is_attached()
    }

    /// Loading finished with preferences that are not yet onboarded.
    pub fn needs_onboarding(&self) -> bool {
        let state = self.state.lock();
        !state.is_loading && state.preferences.as_ref().is_some_and(|p| !p.onboarded)
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.state.lock();
        StoreSnapshot {
            preferences: state.preferences.clone(),
            sessions: state.sessions.clone(),
            current_session_id: state.current_session_id,
            is_loading: state.is_loading,
            is_dark: state.is_dark,
            needs_onboarding: !state.is_loading
                && state.preferences.as_ref().is_some_and(|p| !p.onboarded),
        }
    }

    /// Fetch preferences and sessions concurrently.
    ///
    /// `is_loading` goes false once the preference fetch settles, whatever the
    /// session fetch does. Failures are logged and leave the previous values.
    pub async fn load(&self) {
        self.set_loading(true);

        let preferences = async {
            match self.backend.get_preferences().await {
                Ok(prefs) => self.apply_preferences(prefs),
                Err(e) => warn!(error = %e, "Failed to load preferences"),
            }
            self.set_loading(false);
        };

        let sessions = async {
            if let Err(e) = self.refresh_sessions().await {
                warn!(error = %e, "Failed to load sessions");
            }
        };

        tokio::join!(preferences, sessions);
        info!(
            preferences_loaded = self.state.lock().preferences.is_some(),
            "Client state loaded"
        );
    }

    fn set_loading(&self, loading: bool) {
        let changed = {
            let mut state = self.state.lock();
            let changed = state.is_loading != loading;
            state.is_loading = loading;
            changed
        };
        if changed {
            self.emit(StoreEvent::LoadingChanged(loading));
        }
    }

    /// Replace preferences wholesale. Responses apply in arrival order, so the
    /// last one to arrive wins.
    fn apply_preferences(&self, prefs: UserPreferences) {
        self.state.lock().preferences = Some(prefs.clone());
        self.emit(StoreEvent::PreferencesChanged(Some(prefs)));
        self.resolve_appearance();
    }

    /// Re-evaluate `is_dark` when the declared theme changed, and attach the
    /// OS subscription only while that theme is `System`.
    fn resolve_appearance(&self) {
        let mut watcher = self.watcher.lock();

        let (declared, epoch) = {
            let mut state = self.state.lock();
            let Some(declared) = state.preferences.as_ref().map(|p| p.theme) else {
                return;
            };
            if state.resolved_theme == Some(declared) {
                return;
            }
            state.resolved_theme = Some(declared);
            state.theme_epoch += 1;
            (declared, state.theme_epoch)
        };

        watcher.detach();

        // Subscribe before reading so a change in between is still delivered.
        let os_rx = (declared == Theme::System).then(|| self.appearance.subscribe());
        let os_dark = os_rx.as_ref().map_or(false, |rx| *rx.borrow());
        let is_dark = resolve_is_dark(declared, os_dark);

        let changed = {
            let mut state = self.state.lock();
            let changed = state.is_dark != is_dark;
            state.is_dark = is_dark;
            changed
        };
        debug!(theme = %declared, is_dark, "Resolved appearance");
        if changed {
            self.emit(StoreEvent::AppearanceChanged(is_dark));
        }

        if let Some(rx) = os_rx {
            let state = Arc::clone(&self.state);
            let events = self.event_tx.clone();
            watcher.attach(rx, move |os_dark| {
                let changed = {
                    let mut state = state.lock();
                    if state.theme_epoch != epoch {
                        return;
                    }
                    let changed = state.is_dark != os_dark;
                    state.is_dark = os_dark;
                    changed
                };
                if changed {
                    debug!(dark = os_dark, "Applied OS appearance change");
                    let _ = events.send(StoreEvent::AppearanceChanged(os_dark));
                }
            });
        }
    }

    /// Send a partial update; local preferences become the server's response.
    pub async fn update_preferences(
        &self,
        update: PreferencesUpdate,
    ) -> StateResult<UserPreferences> {
        let prefs = self
            .backend
            .update_preferences(&update)
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to update preferences"))?;

        self.apply_preferences(prefs.clone());
        Ok(prefs)
    }

    /// Change only the declared theme.
    pub async fn set_theme(&self, theme: Theme) -> StateResult<UserPreferences> {
        self.update_preferences(PreferencesUpdate::theme(theme)).await
    }

    /// Finish first-run onboarding. `name` is trimmed and must not be empty.
    pub async fn complete_onboarding(
        &self,
        name: &str,
        theme: Theme,
    ) -> StateResult<UserPreferences> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StateError::Validation("name must not be empty".to_string()));
        }

        match self.state.lock().preferences.as_ref() {
            None => return Err(StateError::PreferencesNotLoaded),
            Some(prefs) if prefs.onboarded => return Err(StateError::AlreadyOnboarded),
            Some(_) => {}
        }

        let request = OnboardingRequest {
            name: name.to_string(),
            theme,
        };
        let prefs = self
            .backend
            .complete_onboarding(&request)
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to complete onboarding"))?;

        info!(theme = %prefs.theme, "Onboarding complete");
        self.apply_preferences(prefs.clone());
        Ok(prefs)
    }

    /// Create a session and refresh the list.
    ///
    /// Returns `None` when the backend refuses; the selection is never changed.
    pub async fn create_session(&self) -> Option<i64> {
        let id = match self.backend.create_session().await {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "Failed to create session");
                return None;
            }
        };

        info!(session_id = id, "Created session");
        if let Err(e) = self.refresh_sessions().await {
            warn!(error = %e, "Failed to refresh sessions after create");
        }
        Some(id)
    }

    /// Select a session locally. `None` means drafting a new chat.
    pub fn set_current_session(&self, id: Option<i64>) {
        let changed = {
            let mut state = self.state.lock();
            let changed = state.current_session_id != id;
            state.current_session_id = id;
            changed
        };
        if changed {
            debug!(session_id = ?id, "Selected session");
            self.emit(StoreEvent::CurrentSessionChanged(id));
        }
    }

    /// Delete a session remotely, clearing the selection if it pointed there.
    pub async fn delete_session(&self, id: i64) -> StateResult<()> {
        self.backend
            .delete_session(id)
            .await
            .inspect_err(|e| warn!(error = %e, session_id = id, "Failed to delete session"))?;

        info!(session_id = id, "Deleted session");
        if self.current_session_id() == Some(id) {
            self.set_current_session(None);
        }

        if let Err(e) = self.refresh_sessions().await {
            warn!(error = %e, "Failed to refresh sessions after delete");
        }
        Ok(())
    }

    /// Re-fetch the session list and replace it wholesale, in backend order.
    ///
    /// Overlapping refreshes apply in arrival order.
    pub async fn refresh_sessions(&self) -> StateResult<()> {
        let sessions = self.backend.list_sessions().await?;

        self.state.lock().sessions = sessions.clone();
        debug!(count = sessions.len(), "Applied session list");
        self.emit(StoreEvent::SessionsChanged(sessions));
        Ok(())
    }

    /// Release the OS appearance subscription.
    pub fn shutdown(&self) {
        let mut watcher = self.watcher.lock();
        self.state.lock().theme_epoch += 1;
        watcher.detach();
    }
}
