//! Engine wiring.
//!
//! [`Engine`] assembles the store, interceptor, lifecycle watcher, and RPC
//! dispatcher around one collaborator bundle. Hosts build it once at
//! startup, register capture patterns, and then drive it with response
//! taps and tab notifications.
//!
//! # Example
//!
//! ```ignore
//! let engine = Engine::builder()
//!     .indicator(indicator)
//!     .options(options)
//!     .layout(layout)
//!     .renderer(renderer)
//!     .namer(namer)
//!     .downloader(downloader)
//!     .build()?;
//!
//! engine.register_capture(["*://comment.example.com/*"], parser)?;
//!
//! // Per matching response:
//! if let Some(mut tap) = engine.interceptor().begin_response(tab_id, url, sink)? {
//!     tap.data(&chunk);
//!     tap.stop().await?;
//! }
//! ```

// ============================================================================
// Submodules
// ============================================================================

mod builder;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::EngineBuilder;

// ============================================================================
// Imports
// ============================================================================

use std::net::IpAddr;
use std::sync::Arc;

use tracing::debug;

use crate::capture::{PatternSet, ResponseInterceptor};
use crate::collaborators::{CaptureHandler, Collaborators, Indicator};
use crate::error::Result;
use crate::rpc::{Dispatcher, RpcServer};
use crate::store::TabStore;
use crate::tabs::{TabLifecycleWatcher, TabNotification};

// ============================================================================
// Engine
// ============================================================================

/// The assembled capture engine.
pub struct Engine {
    store: Arc<TabStore>,
    interceptor: ResponseInterceptor,
    watcher: TabLifecycleWatcher,
    dispatcher: Arc<Dispatcher>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").finish_non_exhaustive()
    }
}

impl Engine {
    /// Returns a builder for configuring an engine.
    #[inline]
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Assembles the engine from validated configuration.
    pub(crate) fn new(
        capacity: usize,
        indicator: Arc<dyn Indicator>,
        collaborators: Collaborators,
    ) -> Self {
        let store = Arc::new(TabStore::new(Arc::clone(&indicator)));
        let interceptor = ResponseInterceptor::new(Arc::clone(&store), indicator, capacity);
        let watcher = TabLifecycleWatcher::new(Arc::clone(&store));
        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&store), collaborators));

        debug!(capacity, "Engine assembled");

        Self {
            store,
            interceptor,
            watcher,
            dispatcher,
        }
    }

    /// Registers capture patterns with their handler.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pattern`] or [`Error::Config`] for an invalid
    /// pattern set.
    ///
    /// [`Error::Pattern`]: crate::error::Error::Pattern
    /// [`Error::Config`]: crate::error::Error::Config
    pub fn register_capture<I, S>(&self, patterns: I, handler: Arc<dyn CaptureHandler>) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.interceptor.register(PatternSet::new(patterns)?, handler);
        Ok(())
    }

    /// Applies a tab lifecycle notification.
    pub async fn notify(&self, notification: TabNotification) {
        self.watcher.apply(notification).await;
    }

    /// Binds an RPC server over this engine's dispatcher.
    ///
    /// The caller spawns [`RpcServer::run`] on its runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if binding fails.
    ///
    /// [`Error::Io`]: crate::error::Error::Io
    pub async fn serve_rpc(&self, ip: IpAddr, port: u16) -> Result<RpcServer> {
        RpcServer::bind(ip, port, Arc::clone(&self.dispatcher)).await
    }

    /// The per-tab state store.
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<TabStore> {
        &self.store
    }

    /// The response interceptor.
    #[inline]
    #[must_use]
    pub fn interceptor(&self) -> &ResponseInterceptor {
        &self.interceptor
    }

    /// A clonable lifecycle watcher over this engine's store.
    #[inline]
    #[must_use]
    pub fn watcher(&self) -> TabLifecycleWatcher {
        self.watcher.clone()
    }

    /// The RPC dispatcher.
    #[inline]
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use parking_lot::Mutex as PlMutex;
    use serde_json::{Value, json};

    use crate::capture::{PassThrough, RequestMeta};
    use crate::collaborators::{
        Downloader, FileNamer, LayoutEngine, OptionsProvider, TrackRenderer,
    };
    use crate::error::Error;
    use crate::identifiers::TabId;
    use crate::store::{CaptureRecord, RecordMeta, TabContext};

    /// Parses captured bytes as `id:name`.
    struct ColonParser;

    #[async_trait]
    impl CaptureHandler for ColonParser {
        async fn on_captured(
            &self,
            bytes: Vec<u8>,
            context: &mut TabContext,
            _request: &RequestMeta,
        ) -> Result<()> {
            let text = String::from_utf8(bytes).map_err(|e| Error::parse_failed(e.to_string()))?;
            let (id, name) = text
                .split_once(':')
                .ok_or_else(|| Error::parse_failed("expected id:name"))?;
            context.push_record(CaptureRecord::new(
                id,
                RecordMeta::named(name),
                json!({"raw": text}),
            ));
            Ok(())
        }
    }

    struct Stub;

    #[async_trait]
    impl OptionsProvider for Stub {
        async fn get(&self) -> Result<Value> {
            Ok(json!({}))
        }
    }

    #[async_trait]
    impl LayoutEngine for Stub {
        async fn layout(&self, _content: &Value, _options: &Value) -> Result<Value> {
            Ok(json!({"rows": 1}))
        }
    }

    impl TrackRenderer for Stub {
        fn render(&self, record: &CaptureRecord, _options: &Value) -> Result<Vec<u8>> {
            Ok(record.meta.name.clone().into_bytes())
        }
    }

    impl FileNamer for Stub {
        fn filename(&self, name: &str, extension: &str) -> Result<String> {
            Ok(format!("{name}.{extension}"))
        }
    }

    #[derive(Default)]
    struct CountingDownloader {
        count: PlMutex<usize>,
    }

    #[async_trait]
    impl Downloader for CountingDownloader {
        async fn download(&self, _content: Vec<u8>, _filename: &str) -> Result<()> {
            *self.count.lock() += 1;
            Ok(())
        }
    }

    fn engine(downloader: Arc<CountingDownloader>) -> Engine {
        let engine = Engine::builder()
            .capture_capacity(1024)
            .options(Arc::new(Stub))
            .layout(Arc::new(Stub))
            .renderer(Arc::new(Stub))
            .namer(Arc::new(Stub))
            .downloader(downloader)
            .build()
            .expect("complete config");
        engine
            .register_capture(["*://comment.example.com/*"], Arc::new(ColonParser))
            .expect("patterns compile");
        engine
    }

    fn sink() -> PassThrough {
        Box::new(|_chunk: &[u8]| {})
    }

    async fn capture(engine: &Engine, tab: TabId, payload: &[u8]) {
        let mut tap = engine
            .interceptor()
            .begin_response(tab, "https://comment.example.com/track.xml", sink())
            .expect("valid url")
            .expect("matching tap");
        tap.data(payload);
        tap.stop().await.expect("capture succeeds");
    }

    #[tokio::test]
    async fn test_capture_then_navigate_then_list() {
        let engine = engine(Arc::new(CountingDownloader::default()));
        let tab = TabId::new(7);

        capture(&engine, tab, b"a:Track A").await;

        let listed = engine
            .dispatcher()
            .dispatch_raw("listCaptures", &[json!(7)])
            .await
            .expect("list");
        assert_eq!(listed[0]["id"], "a");

        // Same-tab navigation empties the list but keeps the tab known.
        engine
            .notify(TabNotification::navigated(tab, "https://example.com/next"))
            .await;

        let listed = engine
            .dispatcher()
            .dispatch_raw("listCaptures", &[json!(7)])
            .await
            .expect("list");
        assert_eq!(listed, json!([]));
        assert!(engine.store().get(tab).is_some());
    }

    #[tokio::test]
    async fn test_removal_forgets_tab() {
        let engine = engine(Arc::new(CountingDownloader::default()));
        let tab = TabId::new(7);

        capture(&engine, tab, b"a:Track A").await;
        engine.notify(TabNotification::removed(tab)).await;

        assert!(engine.store().get(tab).is_none());

        // listCaptures on the forgotten tab is empty, not an error.
        let listed = engine
            .dispatcher()
            .dispatch_raw("listCaptures", &[json!(7)])
            .await
            .expect("list");
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn test_download_roundtrip_and_missing_record() {
        let downloader = Arc::new(CountingDownloader::default());
        let engine = engine(downloader.clone());
        let tab = TabId::new(7);

        capture(&engine, tab, b"a:Track A").await;

        engine
            .dispatcher()
            .dispatch_raw("downloadCapture", &[json!(7), json!("a")])
            .await
            .expect("download");
        assert_eq!(*downloader.count.lock(), 1);

        let err = engine
            .dispatcher()
            .dispatch_raw("downloadCapture", &[json!(7), json!("missing-id")])
            .await
            .expect_err("missing record");
        assert!(matches!(err, Error::RecordNotFound { .. }));
        assert_eq!(*downloader.count.lock(), 1);
    }

    #[tokio::test]
    async fn test_multiple_captures_accumulate() {
        let engine = engine(Arc::new(CountingDownloader::default()));
        let tab = TabId::new(7);

        capture(&engine, tab, b"a:Track A").await;
        capture(&engine, tab, b"b:Track B").await;

        let listed = engine
            .dispatcher()
            .dispatch_raw("listCaptures", &[json!(7)])
            .await
            .expect("list");
        assert_eq!(listed.as_array().map(Vec::len), Some(2));
    }
}
