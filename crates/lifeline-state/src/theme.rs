//! Live OS appearance subscription.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Explicit subscribe/unsubscribe handle for OS appearance changes.
///
/// At most one subscription is live. [`ThemeWatcher::attach`] replaces any
/// previous one, [`ThemeWatcher::detach`] releases it, and dropping the
/// watcher detaches.
#[derive(Debug, Default)]
pub struct ThemeWatcher {
    task: Option<JoinHandle<()>>,
}

impl ThemeWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow `rx`, calling `on_change` with each new value. Needs a Tokio runtime.
    pub fn attach<F>(&mut self, mut rx: watch::Receiver<bool>, on_change: F)
    where
        F: Fn(bool) + Send + 'static,
    {
        self.detach();

        self.task = Some(tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let dark = *rx.borrow_and_update();
                on_change(dark);
            }
        }));
        debug!("Attached OS appearance subscription");
    }

    pub fn detach(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Detached OS appearance subscription");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for ThemeWatcher {
    fn drop(&mut self) {
        self.detach();
    }
}
