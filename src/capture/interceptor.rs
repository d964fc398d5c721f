//! Response interception and streaming capture.
//!
//! [`ResponseInterceptor`] holds the registered pattern sets and their
//! capture handlers. For each matching response the host obtains a
//! [`ResponseTap`] and drives it through an explicit push lifecycle:
//!
//! ```text
//! begin_response() ──► data(chunk)* ──► stop()    (complete)
//!                                  └──► abort()   (stream failed)
//! ```
//!
//! Every chunk is forwarded to the pass-through sink *before* it is
//! copied, so the original consumer receives the full response unmodified
//! and undelayed no matter what happens to the capture.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use parking_lot::RwLock;
use tracing::{debug, trace};
use url::Url;

use crate::capture::buffer::{AppendOutcome, CaptureBuffer};
use crate::capture::pattern::PatternSet;
use crate::collaborators::{CaptureHandler, Indicator};
use crate::error::Result;
use crate::identifiers::TabId;
use crate::store::{ContextHandle, TabStore};

// ============================================================================
// Types
// ============================================================================

/// Sink delivering response bytes to the original consumer.
///
/// Called for every chunk, unconditionally, before any capture bookkeeping.
pub type PassThrough = Box<dyn FnMut(&[u8]) + Send>;

// ============================================================================
// RequestMeta
// ============================================================================

/// Metadata of an intercepted request.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    /// Tab that issued the request.
    pub tab_id: TabId,

    /// Request URL.
    pub url: Url,
}

// ============================================================================
// ResponseInterceptor
// ============================================================================

/// One registration: a pattern set paired with its capture handler.
struct Registration {
    patterns: PatternSet,
    handler: Arc<dyn CaptureHandler>,
}

/// Registers interest in response URLs and opens taps on matching ones.
pub struct ResponseInterceptor {
    /// Shared per-tab state.
    store: Arc<TabStore>,
    /// Indicator shown when a capture leaves records behind.
    indicator: Arc<dyn Indicator>,
    /// Capture buffer capacity, bytes.
    capacity: usize,
    /// Registered pattern sets, matched in registration order.
    registrations: RwLock<Vec<Registration>>,
}

impl ResponseInterceptor {
    /// Creates an interceptor with no registrations.
    #[must_use]
    pub fn new(store: Arc<TabStore>, indicator: Arc<dyn Indicator>, capacity: usize) -> Self {
        Self {
            store,
            indicator,
            capacity,
            registrations: RwLock::new(Vec::new()),
        }
    }

    /// Registers a pattern set with its capture handler.
    ///
    /// A response URL is served by the first registration that matches it.
    pub fn register(&self, patterns: PatternSet, handler: Arc<dyn CaptureHandler>) {
        debug!(pattern_count = patterns.len(), "Registering capture patterns");
        self.registrations
            .write()
            .push(Registration { patterns, handler });
    }

    /// Number of registrations.
    #[inline]
    #[must_use]
    pub fn registration_count(&self) -> usize {
        self.registrations.read().len()
    }

    /// The capture buffer capacity in bytes.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Opens a tap for a response, if its URL matches a registration.
    ///
    /// Returns `Ok(None)` for non-matching URLs: the response is of no
    /// interest and the host should not report its chunks here at all.
    /// A matching response resolves (or lazily creates) the tab's context
    /// entry immediately, pinning it for the lifetime of the tap.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Url`] if `url` cannot be parsed.
    ///
    /// [`Error::Url`]: crate::error::Error::Url
    pub fn begin_response(
        &self,
        tab_id: TabId,
        url: &str,
        pass_through: PassThrough,
    ) -> Result<Option<ResponseTap>> {
        let url = Url::parse(url)?;

        let handler = {
            let registrations = self.registrations.read();
            registrations
                .iter()
                .find(|registration| registration.patterns.matches(url.as_str()))
                .map(|registration| Arc::clone(&registration.handler))
        };

        let Some(handler) = handler else {
            trace!(%tab_id, %url, "Response does not match any capture pattern");
            return Ok(None);
        };

        debug!(%tab_id, %url, "Opening capture tap");

        Ok(Some(ResponseTap {
            meta: RequestMeta { tab_id, url },
            context: self.store.context(tab_id),
            buffer: CaptureBuffer::new(self.capacity),
            pass_through,
            handler,
            store: Arc::clone(&self.store),
            indicator: Arc::clone(&self.indicator),
        }))
    }
}

// ============================================================================
// ResponseTap
// ============================================================================

/// A pass-through tap on one in-flight response.
///
/// Owns the private capture buffer for this request. Dropping the tap
/// without calling [`stop`](Self::stop) voids the capture, same as
/// [`abort`](Self::abort).
pub struct ResponseTap {
    meta: RequestMeta,
    /// Context entry pinned at request start; completion re-checks it.
    context: ContextHandle,
    buffer: CaptureBuffer,
    pass_through: PassThrough,
    handler: Arc<dyn CaptureHandler>,
    store: Arc<TabStore>,
    indicator: Arc<dyn Indicator>,
}

impl ResponseTap {
    /// Delivers one response chunk.
    ///
    /// The chunk goes to the pass-through sink first, then into the
    /// capture buffer. Once the buffer has overflowed, chunks are only
    /// passed through.
    pub fn data(&mut self, chunk: &[u8]) {
        (self.pass_through)(chunk);

        let was_overflowed = self.buffer.is_overflowed();
        if self.buffer.append(chunk) == AppendOutcome::Overflowed && !was_overflowed {
            debug!(
                tab_id = %self.meta.tab_id,
                url = %self.meta.url,
                capacity = self.buffer.capacity(),
                "Response exceeds capture capacity, voiding capture"
            );
        }
    }

    /// Completes the stream.
    ///
    /// An overflowed capture is void: the handler is not invoked and no
    /// record is produced. A capture whose tab entry was removed (or
    /// removed and recreated) while the response was in flight is dropped
    /// rather than recreating state for a dead tab. Otherwise the handler
    /// runs with exclusive access to the tab's context, and the tab
    /// indicator is shown afterwards when any records exist.
    ///
    /// # Errors
    ///
    /// Propagates the capture handler's failure; no indicator is shown in
    /// that case.
    pub async fn stop(self) -> Result<()> {
        let Self {
            meta,
            context,
            buffer,
            handler,
            store,
            indicator,
            ..
        } = self;

        let Some(bytes) = buffer.finalize() else {
            return Ok(());
        };

        let Some(live) = store.get(meta.tab_id) else {
            debug!(tab_id = %meta.tab_id, url = %meta.url, "Tab closed mid-capture, dropping");
            return Ok(());
        };
        if !Arc::ptr_eq(&live, &context) {
            debug!(tab_id = %meta.tab_id, url = %meta.url, "Tab entry replaced mid-capture, dropping");
            return Ok(());
        }

        trace!(tab_id = %meta.tab_id, bytes = bytes.len(), "Capture complete");

        let mut guard = context.lock().await;
        handler.on_captured(bytes, &mut guard, &meta).await?;

        if !guard.records.is_empty() {
            indicator.show(meta.tab_id);
        }

        Ok(())
    }

    /// Aborts the stream, voiding the capture.
    ///
    /// Pass-through delivery already happened chunk by chunk; only the
    /// private copy is discarded.
    pub fn abort(self) {
        debug!(tab_id = %self.meta.tab_id, url = %self.meta.url, "Capture aborted");
    }

    /// Drives the tap from a chunk stream, then completes it.
    ///
    /// Convenience for hosts exposing responses as `futures` streams.
    ///
    /// # Errors
    ///
    /// Same as [`stop`](Self::stop).
    pub async fn consume<S>(mut self, mut stream: S) -> Result<()>
    where
        S: Stream<Item = Vec<u8>> + Unpin + Send,
    {
        while let Some(chunk) = stream.next().await {
            self.data(&chunk);
        }
        self.stop().await
    }

    /// Request metadata for this tap.
    #[inline]
    #[must_use]
    pub fn meta(&self) -> &RequestMeta {
        &self.meta
    }

    /// Returns `true` if the capture has already overflowed.
    #[inline]
    #[must_use]
    pub fn is_overflowed(&self) -> bool {
        self.buffer.is_overflowed()
    }
}

// ============================================================================
// Tests
// ============================================================================
