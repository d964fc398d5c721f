//! Per-tab capture state store.
//!
//! [`TabStore`] owns every [`TabContext`], keyed by [`TabId`]. Entries are
//! created lazily on first reference and destroyed on tab discard or
//! removal; same-tab navigation only empties the record list.
//!
//! # Locking
//!
//! The map itself sits behind a `parking_lot` mutex that is held only for
//! lookups, never across awaits. Each entry is an `Arc<tokio::sync::Mutex>`
//! so mutation of one tab's records is serialized (including across
//! collaborator awaits) while captures for unrelated tabs proceed
//! independently.

// ============================================================================
// Submodules
// ============================================================================

mod context;

// ============================================================================
// Re-exports
// ============================================================================

pub use context::{CaptureRecord, RecordMeta, RecordSummary, TabContext};

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use crate::collaborators::Indicator;
use crate::identifiers::TabId;

// ============================================================================
// Types
// ============================================================================

/// Shared handle to one tab's context.
pub type ContextHandle = Arc<AsyncMutex<TabContext>>;

/// Map of tab IDs to context handles.
type ContextMap = FxHashMap<TabId, ContextHandle>;

// ============================================================================
// TabStore
// ============================================================================

/// Associative container of per-tab capture state.
///
/// Cheap to clone via `Arc`; the interceptor, lifecycle watcher, and RPC
/// dispatcher all share one instance.
pub struct TabStore {
    /// Per-tab entries.
    entries: Mutex<ContextMap>,
    /// Indicator collaborator, hidden on clear/remove.
    indicator: Arc<dyn Indicator>,
}

impl TabStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(indicator: Arc<dyn Indicator>) -> Self {
        Self {
            entries: Mutex::new(ContextMap::default()),
            indicator,
        }
    }

    /// Returns the context for a tab, creating an empty one if absent.
    ///
    /// Never fails; this is the only way entries come into existence.
    pub fn context(&self, tab_id: TabId) -> ContextHandle {
        let mut entries = self.entries.lock();
        Arc::clone(
            entries
                .entry(tab_id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(TabContext::new(tab_id)))),
        )
    }

    /// Read-only lookup. Does not create an entry.
    #[must_use]
    pub fn get(&self, tab_id: TabId) -> Option<ContextHandle> {
        self.entries.lock().get(&tab_id).map(Arc::clone)
    }

    /// Empties the record list for a tab, creating the entry if needed.
    ///
    /// Used on same-tab navigation: `meta_info` survives, the entry stays
    /// resolvable, and the tab's indicator is hidden.
    pub async fn clear(&self, tab_id: TabId) {
        let handle = self.context(tab_id);
        handle.lock().await.clear_records();
        self.indicator.hide(tab_id);
        debug!(%tab_id, "Cleared tab records");
    }

    /// Destroys the entry for a tab and hides its indicator.
    ///
    /// Used on tab discard and removal. A later capture completion for this
    /// tab will find the entry gone and drop itself.
    pub fn remove(&self, tab_id: TabId) {
        let removed = self.entries.lock().remove(&tab_id);
        self.indicator.hide(tab_id);

        if removed.is_some() {
            debug!(%tab_id, "Removed tab entry");
        }
    }

    /// Returns the number of tracked tabs.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if no tabs are tracked.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex as PlMutex;
    use serde_json::json;

    use crate::store::context::RecordMeta;

    /// Indicator that records every show/hide call.
    #[derive(Default)]
    struct RecordingIndicator {
        calls: PlMutex<Vec<(TabId, bool)>>,
    }

    impl Indicator for RecordingIndicator {
        fn show(&self, tab_id: TabId) {
            self.calls.lock().push((tab_id, true));
        }

        fn hide(&self, tab_id: TabId) {
            self.calls.lock().push((tab_id, false));
        }
    }

    fn store_with_indicator() -> (TabStore, Arc<RecordingIndicator>) {
        let indicator = Arc::new(RecordingIndicator::default());
        let store = TabStore::new(indicator.clone());
        (store, indicator)
    }

    #[tokio::test]
    async fn test_get_or_create_is_lazy() {
        let (store, _) = store_with_indicator();
        let tab = TabId::new(7);

        assert!(store.get(tab).is_none());
        assert!(store.is_empty());

        let handle = store.context(tab);
        assert_eq!(handle.lock().await.tab_id, tab);
        assert_eq!(store.len(), 1);

        // Second access returns the same entry.
        let again = store.context(tab);
        assert!(Arc::ptr_eq(&handle, &again));
    }

    #[tokio::test]
    async fn test_clear_empties_records_keeps_entry() {
        let (store, indicator) = store_with_indicator();
        let tab = TabId::new(7);

        let handle = store.context(tab);
        {
            let mut context = handle.lock().await;
            context.push_record(CaptureRecord::new(
                "a",
                RecordMeta::named("Track A"),
                json!(null),
            ));
            context.meta_info.insert("pageTitle".into(), json!("Episode"));
        }

        store.clear(tab).await;

        let live = store.get(tab).expect("entry survives clear");
        assert!(Arc::ptr_eq(&handle, &live));
        let context = live.lock().await;
        assert!(context.records.is_empty());
        assert_eq!(context.meta_info.get("pageTitle"), Some(&json!("Episode")));
        assert_eq!(*indicator.calls.lock(), vec![(tab, false)]);
    }

    #[tokio::test]
    async fn test_clear_creates_missing_entry() {
        let (store, _) = store_with_indicator();
        let tab = TabId::new(3);

        store.clear(tab).await;
        assert!(store.get(tab).is_some());
    }

    #[test]
    fn test_remove_destroys_entry() {
        let (store, indicator) = store_with_indicator();
        let tab = TabId::new(7);

        store.context(tab);
        store.remove(tab);

        assert!(store.get(tab).is_none());
        assert!(store.is_empty());
        assert_eq!(*indicator.calls.lock(), vec![(tab, false)]);
    }

    #[test]
    fn test_remove_unknown_tab_still_hides() {
        let (store, indicator) = store_with_indicator();
        let tab = TabId::new(9);

        store.remove(tab);
        assert_eq!(*indicator.calls.lock(), vec![(tab, false)]);
    }
}
