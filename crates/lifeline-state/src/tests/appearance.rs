//! Effective appearance: declared theme against the OS signal.

use super::harness::{store_with, wait_for_event, MockBackend};
use crate::{StoreEvent, Theme};
use std::time::Duration;

#[tokio::test]
async fn system_theme_tracks_os_signal() {
    let backend = MockBackend::new().with_theme(Theme::System);
    let (store, os) = store_with(&backend, false);
    let mut events = store.subscribe();
    store.load().await;

    assert!(!store.is_dark());
    assert!(store.is_following_os());

    os.set_dark(true);
    wait_for_event(&mut events, |e| *e == StoreEvent::AppearanceChanged(true)).await;
    assert!(store.is_dark());

    os.set_dark(false);
    wait_for_event(&mut events, |e| *e == StoreEvent::AppearanceChanged(false)).await;
    assert!(!store.is_dark());
}

#[tokio::test]
async fn system_theme_reads_os_at_load() {
    let backend = MockBackend::new().with_theme(Theme::System);
    let (store, _os) = store_with(&backend, true);

    store.load().await;

    assert!(store.is_dark());
}

#[tokio::test]
async fn explicit_themes_ignore_os_signal() {
    for (theme, expected) in [(Theme::Light, false), (Theme::Dark, true)] {
        let backend = MockBackend::new().with_theme(theme);
        let (store, os) = store_with(&backend, !expected);
        store.load().await;

        assert_eq!(store.is_dark(), expected);
        assert!(!store.is_following_os());
        assert_eq!(os.subscriber_count(), 0);

        os.set_dark(expected);
        os.set_dark(!expected);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.is_dark(), expected, "theme {theme}");
    }
}

#[tokio::test]
async fn switching_away_from_system_detaches() {
    let backend = MockBackend::new();
    let (store, os) = store_with(&backend, true);
    store.load().await;
    assert!(store.is_dark());
    assert!(store.is_following_os());

    store.set_theme(Theme::Light).await.unwrap();
    assert!(!store.is_dark());
    assert!(!store.is_following_os());

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(os.subscriber_count(), 0);

    os.set_dark(false);
    os.set_dark(true);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!store.is_dark());
}

#[tokio::test]
async fn returning_to_system_reads_current_os_value() {
    let backend = MockBackend::new().with_theme(Theme::Dark);
    let (store, os) = store_with(&backend, true);
    store.load().await;

    os.set_dark(false);
    store.set_theme(Theme::System).await.unwrap();

    assert!(!store.is_dark());
    assert!(store.is_following_os());
    assert_eq!(os.subscriber_count(), 1);
}

#[tokio::test]
async fn shutdown_releases_os_subscription() {
    let backend = MockBackend::new();
    let (store, os) = store_with(&backend, false);
    store.load().await;
    assert_eq!(os.subscriber_count(), 1);

    store.shutdown();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(!store.is_following_os());
    assert_eq!(os.subscriber_count(), 0);

    os.set_dark(true);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!store.is_dark());
}

#[tokio::test]
async fn appearance_unresolved_until_preferences_load() {
    let backend = MockBackend::new();
    let (store, os) = store_with(&backend, true);

    assert!(!store.is_dark());
    assert_eq!(os.subscriber_count(), 0);
}
