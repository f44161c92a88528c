//! Startup load and onboarding.

use super::harness::{store_with, wait_for_event, MockBackend, Op};
use crate::{PreferencesUpdate, StateError, StoreEvent, Theme};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn load_fetches_preferences_and_sessions() {
    let backend = MockBackend::new().with_sessions(3);
    let (store, _) = store_with(&backend, false);

    store.load().await;

    assert!(!store.is_loading());
    assert_eq!(store.preferences().unwrap().user_id, "default_user");
    assert_eq!(store.sessions().len(), 3);
}

#[tokio::test]
async fn loading_gate_opens_before_slow_session_fetch() {
    let backend = MockBackend::new().with_sessions(2);
    backend.delay_next(Op::ListSessions, Duration::from_millis(300));
    let (store, _) = store_with(&backend, false);
    let store = Arc::new(store);
    let mut events = store.subscribe();

    let task = tokio::spawn({
        let store = store.clone();
        async move { store.load().await }
    });

    wait_for_event(&mut events, |e| *e == StoreEvent::LoadingChanged(false)).await;
    assert!(!store.is_loading());
    assert!(store.preferences().is_some());
    assert!(store.sessions().is_empty());

    task.await.unwrap();
    assert_eq!(store.sessions().len(), 2);
}

#[tokio::test]
async fn session_failure_does_not_block_loading() {
    let backend = MockBackend::new();
    backend.fail(Op::ListSessions);
    let (store, _) = store_with(&backend, false);

    store.load().await;

    assert!(!store.is_loading());
    assert!(store.preferences().is_some());
    assert!(store.sessions().is_empty());
}

#[tokio::test]
async fn preference_failure_leaves_preferences_empty() {
    let backend = MockBackend::new().with_sessions(1);
    backend.fail(Op::GetPreferences);
    let (store, _) = store_with(&backend, false);

    store.load().await;

    assert!(!store.is_loading());
    assert!(store.preferences().is_none());
    assert!(!store.needs_onboarding());
    assert_eq!(store.sessions().len(), 1);
}

#[tokio::test]
async fn onboarding_offered_then_completed_once() {
    let backend = MockBackend::new();
    let (store, _) = store_with(&backend, false);
    assert!(store.preferences().is_none());
    assert!(store.is_loading());

    store.load().await;
    assert!(store.needs_onboarding());

    let prefs = store.complete_onboarding("  Ada ", Theme::Dark).await.unwrap();

    assert!(prefs.onboarded);
    assert_eq!(prefs.theme, Theme::Dark);
    assert_eq!(prefs.name.as_deref(), Some("Ada"));
    assert!(store.preferences().unwrap().onboarded);
    assert!(store.is_dark());
    assert!(!store.needs_onboarding());

    let again = store.complete_onboarding("Ada", Theme::Light).await;
    assert!(matches!(again, Err(StateError::AlreadyOnboarded)));
    assert!(!store.needs_onboarding());

    let calls = backend.calls();
    let onboarding_calls = calls
        .lock()
        .unwrap()
        .iter()
        .filter(|c| c.starts_with("complete_onboarding"))
        .cloned()
        .collect::<Vec<_>>();
    assert_eq!(onboarding_calls, vec!["complete_onboarding Ada dark".to_string()]);
}

#[tokio::test]
async fn onboarding_failure_propagates() {
    let backend = MockBackend::new();
    backend.fail(Op::CompleteOnboarding);
    let (store, _) = store_with(&backend, false);
    store.load().await;

    let result = store.complete_onboarding("Ada", Theme::Dark).await;

    assert!(matches!(result, Err(StateError::Api { status: 500, .. })));
    assert!(store.needs_onboarding());
}

#[tokio::test]
async fn update_replaces_preferences_with_server_response() {
    let backend = MockBackend::new();
    let (store, _) = store_with(&backend, false);
    store.load().await;

    let update = PreferencesUpdate {
        model: Some("gpt-4o-mini".to_string()),
        temperature: Some(0.2),
        ..Default::default()
    };
    let prefs = store.update_preferences(update).await.unwrap();

    assert_eq!(store.preferences(), Some(prefs.clone()));
    assert_eq!(prefs.model, "gpt-4o-mini");
    assert_eq!(prefs.temperature, 0.2);
    // Server-owned fields come from the response, not a local merge.
    assert_eq!(prefs.updated_at.as_deref(), Some("2024-05-02T09:00:00"));
}

#[tokio::test]
async fn update_failure_propagates_and_keeps_preferences() {
    let backend = MockBackend::new();
    let (store, _) = store_with(&backend, false);
    store.load().await;
    let before = store.preferences();

    backend.fail(Op::UpdatePreferences);
    let result = store.set_theme(Theme::Dark).await;

    assert!(matches!(result, Err(StateError::Api { .. })));
    assert_eq!(store.preferences(), before);
    assert!(!store.is_dark());
}

#[tokio::test]
async fn late_preference_response_wins() {
    let backend = MockBackend::new();
    let (store, _) = store_with(&backend, false);
    store.load().await;

    // Dark is applied server-side first but its response arrives last.
    backend.delay_next(Op::UpdatePreferences, Duration::from_millis(150));

    let slow = store.set_theme(Theme::Dark);
    let fast = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        store.set_theme(Theme::Light).await
    };
    let (slow, fast) = tokio::join!(slow, fast);

    assert_eq!(slow.unwrap().theme, Theme::Dark);
    assert_eq!(fast.unwrap().theme, Theme::Light);
    assert_eq!(store.preferences().unwrap().theme, Theme::Dark);
    assert!(store.is_dark());
}

#[tokio::test]
async fn write_applied_last_by_server_is_kept_locally() {
    let backend = MockBackend::new();
    let (store, _) = store_with(&backend, false);
    store.load().await;

    // Dark reaches the server after Light, so the server ends on Dark.
    backend.stall_next(Op::UpdatePreferences, Duration::from_millis(150));

    let slow = store.set_theme(Theme::Dark);
    let fast = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        store.set_theme(Theme::Light).await
    };
    let (slow, fast) = tokio::join!(slow, fast);
    slow.unwrap();
    fast.unwrap();

    assert_eq!(backend.server_preferences().theme, Theme::Dark);
    assert_eq!(store.preferences().unwrap().theme, Theme::Dark);
    assert!(store.is_dark());
}
