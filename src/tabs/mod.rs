//! Tab lifecycle tracking.
//!
//! Maps host tab notifications to store mutations:
//!
//! | Notification | Effect |
//! |--------------|--------|
//! | updated, `discarded` | entry destroyed, indicator hidden |
//! | updated, new `url` | records cleared, indicator hidden |
//! | removed | entry destroyed |
//!
//! These are the only transitions. A tab that never navigates and is never
//! removed accumulates records indefinitely; only each individual capture
//! is capacity-bounded.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::identifiers::TabId;
use crate::store::TabStore;

// ============================================================================
// TabNotification
// ============================================================================

/// A host-level tab lifecycle notification.
///
/// Mirrors the shape of browser `tabs.onUpdated` / `tabs.onRemoved`
/// signals: an update carries a change set, removal carries only the tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabNotification {
    /// The tab changed state.
    Updated {
        /// Affected tab.
        tab_id: TabId,
        /// The tab was discarded (unloaded) by the host.
        discarded: bool,
        /// New URL, set when the tab navigated.
        url: Option<String>,
    },

    /// The tab was closed.
    Removed {
        /// Affected tab.
        tab_id: TabId,
    },
}

impl TabNotification {
    /// Creates a discard notification.
    #[inline]
    #[must_use]
    pub fn discarded(tab_id: TabId) -> Self {
        Self::Updated {
            tab_id,
            discarded: true,
            url: None,
        }
    }

    /// Creates a navigation notification.
    #[inline]
    #[must_use]
    pub fn navigated(tab_id: TabId, url: impl Into<String>) -> Self {
        Self::Updated {
            tab_id,
            discarded: false,
            url: Some(url.into()),
        }
    }

    /// Creates a removal notification.
    #[inline]
    #[must_use]
    pub const fn removed(tab_id: TabId) -> Self {
        Self::Removed { tab_id }
    }

    /// The tab this notification refers to.
    #[inline]
    #[must_use]
    pub const fn tab_id(&self) -> TabId {
        match self {
            Self::Updated { tab_id, .. } | Self::Removed { tab_id } => *tab_id,
        }
    }
}

// ============================================================================
// TabLifecycleWatcher
// ============================================================================

/// Applies tab lifecycle notifications to the store.
#[derive(Clone)]
pub struct TabLifecycleWatcher {
    store: Arc<TabStore>,
}

impl TabLifecycleWatcher {
    /// Creates a watcher over the given store.
    #[inline]
    #[must_use]
    pub fn new(store: Arc<TabStore>) -> Self {
        Self { store }
    }

    /// Applies one notification.
    ///
    /// Discard wins over a URL change when an update carries both.
    pub async fn apply(&self, notification: TabNotification) {
        trace!(?notification, "Tab notification");

        match notification {
            TabNotification::Updated {
                tab_id,
                discarded: true,
                ..
            } => {
                debug!(%tab_id, "Tab discarded");
                self.store.remove(tab_id);
            }

            TabNotification::Updated {
                tab_id,
                url: Some(_),
                ..
            } => {
                debug!(%tab_id, "Tab navigated");
                self.store.clear(tab_id).await;
            }

            // An update with neither flag carries nothing we track.
            TabNotification::Updated { .. } => {}

            TabNotification::Removed { tab_id } => {
                debug!(%tab_id, "Tab removed");
                self.store.remove(tab_id);
            }
        }
    }

    /// Drains a notification channel until the sender side closes.
    ///
    /// Hosts that surface tab events on a channel spawn this as a task.
    pub async fn run(self, mut notifications: mpsc::UnboundedReceiver<TabNotification>) {
        while let Some(notification) = notifications.recv().await {
            self.apply(notification).await;
        }
        debug!("Tab notification channel closed");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::collaborators::NullIndicator;
    use crate::store::{CaptureRecord, RecordMeta};

    fn watcher() -> (TabLifecycleWatcher, Arc<TabStore>) {
        let store = Arc::new(TabStore::new(Arc::new(NullIndicator)));
        (TabLifecycleWatcher::new(Arc::clone(&store)), store)
    }

    async fn seed_record(store: &TabStore, tab_id: TabId) {
        let context = store.context(tab_id);
        context.lock().await.push_record(CaptureRecord::new(
            "a",
            RecordMeta::named("Track A"),
            json!(null),
        ));
    }

    #[tokio::test]
    async fn test_removed_destroys_entry() {
        let (watcher, store) = watcher();
        let tab = TabId::new(7);
        seed_record(&store, tab).await;

        watcher.apply(TabNotification::removed(tab)).await;

        assert!(store.get(tab).is_none());
    }

    #[tokio::test]
    async fn test_discarded_destroys_entry() {
        let (watcher, store) = watcher();
        let tab = TabId::new(7);
        seed_record(&store, tab).await;

        watcher.apply(TabNotification::discarded(tab)).await;

        assert!(store.get(tab).is_none());
    }

    #[tokio::test]
    async fn test_navigation_clears_but_keeps_entry() {
        let (watcher, store) = watcher();
        let tab = TabId::new(7);
        seed_record(&store, tab).await;
        store
            .context(tab)
            .lock()
            .await
            .meta_info
            .insert("pageTitle".into(), json!("Episode"));

        watcher
            .apply(TabNotification::navigated(tab, "https://example.com/next"))
            .await;

        let context = store.get(tab).expect("entry survives navigation");
        let guard = context.lock().await;
        assert!(guard.records.is_empty());
        assert_eq!(guard.meta_info.get("pageTitle"), Some(&json!("Episode")));
    }

    #[tokio::test]
    async fn test_discard_wins_over_url_change() {
        let (watcher, store) = watcher();
        let tab = TabId::new(7);
        seed_record(&store, tab).await;

        watcher
            .apply(TabNotification::Updated {
                tab_id: tab,
                discarded: true,
                url: Some("https://example.com/next".into()),
            })
            .await;

        assert!(store.get(tab).is_none());
    }

    #[tokio::test]
    async fn test_plain_update_is_ignored() {
        let (watcher, store) = watcher();
        let tab = TabId::new(7);
        seed_record(&store, tab).await;

        watcher
            .apply(TabNotification::Updated {
                tab_id: tab,
                discarded: false,
                url: None,
            })
            .await;

        let context = store.get(tab).expect("entry untouched");
        assert_eq!(context.lock().await.records.len(), 1);
    }

    #[tokio::test]
    async fn test_run_drains_channel() {
        let (watcher, store) = watcher();
        let tab = TabId::new(7);
        seed_record(&store, tab).await;

        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(watcher.run(rx));

        tx.send(TabNotification::removed(tab)).expect("send");
        drop(tx);
        task.await.expect("watcher task");

        assert!(store.get(tab).is_none());
    }
}
