//! Collaborator contracts at the engine's seams.
//!
//! The core does not parse captured bytes, compute subtitle layout, render
//! output files, pick file names, store user options, or draw UI. Each of
//! those concerns sits behind a narrow trait here, implemented by the host
//! application and injected through [`Engine::builder`].
//!
//! | Trait | Concern |
//! |-------|---------|
//! | [`CaptureHandler`] | Turn captured bytes into records |
//! | [`OptionsProvider`] | Persisted user options |
//! | [`LayoutEngine`] | Derived presentation data for a record |
//! | [`TrackRenderer`] | Final output bytes (subtitle file) |
//! | [`FileNamer`] | Download file name |
//! | [`Downloader`] | Download side effect |
//! | [`Indicator`] | Per-tab UI affordance |
//!
//! [`Engine::builder`]: crate::engine::Engine::builder

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::capture::RequestMeta;
use crate::error::Result;
use crate::identifiers::TabId;
use crate::store::{CaptureRecord, TabContext};

// ============================================================================
// CaptureHandler
// ============================================================================

/// Receives a completed capture for parsing.
///
/// Invoked once per fully buffered response, with exclusive access to the
/// tab's context. The handler parses `bytes` into zero or more records and
/// appends them via [`TabContext::push_record`]. Captures that overflowed
/// the buffer never reach this trait.
#[async_trait]
pub trait CaptureHandler: Send + Sync {
    /// Handles the captured response bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseFailed`] (or any collaborator error) to fail
    /// the capture; no record is produced and no indicator is shown.
    ///
    /// [`Error::ParseFailed`]: crate::error::Error::ParseFailed
    async fn on_captured(
        &self,
        bytes: Vec<u8>,
        context: &mut TabContext,
        request: &RequestMeta,
    ) -> Result<()>;
}

// ============================================================================
// OptionsProvider
// ============================================================================

/// Retrieves persisted user options.
///
/// Options are a free-form JSON value interpreted by the layout and
/// rendering collaborators, not by the core.
#[async_trait]
pub trait OptionsProvider: Send + Sync {
    /// Returns the current user options.
    async fn get(&self) -> Result<Value>;
}

// ============================================================================
// LayoutEngine
// ============================================================================

/// Computes derived presentation data for a record's content.
#[async_trait]
pub trait LayoutEngine: Send + Sync {
    /// Computes the layout for `content` under the given options.
    async fn layout(&self, content: &Value, options: &Value) -> Result<Value>;
}

// ============================================================================
// TrackRenderer
// ============================================================================

/// Renders a record (with layout attached) into final output bytes.
pub trait TrackRenderer: Send + Sync {
    /// Serializes the record into the output file format.
    fn render(&self, record: &CaptureRecord, options: &Value) -> Result<Vec<u8>>;
}

// ============================================================================
// FileNamer
// ============================================================================

/// Produces a download file name from a display name and extension.
pub trait FileNamer: Send + Sync {
    /// Returns the file name to download as.
    fn filename(&self, name: &str, extension: &str) -> Result<String>;
}

// ============================================================================
// Downloader
// ============================================================================

/// Triggers the host download side effect.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Starts a download of `content` under `filename`.
    async fn download(&self, content: Vec<u8>, filename: &str) -> Result<()>;
}

// ============================================================================
// Indicator
// ============================================================================

/// Per-tab UI affordance shown while captured records exist for the tab.
///
/// Show/hide are fire-and-forget host actions; they cannot fail.
pub trait Indicator: Send + Sync {
    /// Shows the indicator for a tab.
    fn show(&self, tab_id: TabId);

    /// Hides the indicator for a tab.
    fn hide(&self, tab_id: TabId);
}

/// No-op indicator for hosts without a per-tab UI surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullIndicator;

impl Indicator for NullIndicator {
    fn show(&self, _tab_id: TabId) {}

    fn hide(&self, _tab_id: TabId) {}
}

// ============================================================================
// Collaborators
// ============================================================================

/// Bundle of the collaborators needed by the export path.
///
/// The parse-side collaborator ([`CaptureHandler`]) is registered per
/// pattern set on the interceptor instead and is not part of this bundle.
#[derive(Clone)]
pub struct Collaborators {
    /// Persisted user options.
    pub options: Arc<dyn OptionsProvider>,
    /// Layout computation.
    pub layout: Arc<dyn LayoutEngine>,
    /// Output serialization.
    pub renderer: Arc<dyn TrackRenderer>,
    /// File naming.
    pub namer: Arc<dyn FileNamer>,
    /// Download side effect.
    pub downloader: Arc<dyn Downloader>,
}
