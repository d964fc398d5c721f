//! Danmaku Capture - Per-tab network response capture engine.
//!
//! This library intercepts network responses matching configured URL
//! patterns inside a host browsing environment, buffers their bytes under
//! a strict capacity bound, and associates parsed track records with the
//! tab that produced them. Accumulated records are exposed to other
//! execution contexts through a small JSON message protocol.
//!
//! # Architecture
//!
//! The engine is host-agnostic: the browsing environment drives it.
//!
//! - Response streams are fed through [`ResponseTap`]s with an explicit
//!   push lifecycle (start, data chunks, stop/abort); the original
//!   consumer always receives every byte unmodified
//! - Capture is all-or-nothing: a response that exceeds the configured
//!   buffer capacity produces no record at all
//! - Tab lifecycle notifications keep per-tab state consistent across
//!   navigation, discard, and removal
//! - Popup pages and tooling invoke the exported operations over a
//!   localhost WebSocket endpoint
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use danmaku_capture::{Engine, Result, TabId, TabNotification};
//!
//! # async fn example(
//! #     options: Arc<dyn danmaku_capture::OptionsProvider>,
//! #     layout: Arc<dyn danmaku_capture::LayoutEngine>,
//! #     renderer: Arc<dyn danmaku_capture::TrackRenderer>,
//! #     namer: Arc<dyn danmaku_capture::FileNamer>,
//! #     downloader: Arc<dyn danmaku_capture::Downloader>,
//! #     parser: Arc<dyn danmaku_capture::CaptureHandler>,
//! # ) -> Result<()> {
//! // Build the engine with host collaborators
//! let engine = Engine::builder()
//!     .options(options)
//!     .layout(layout)
//!     .renderer(renderer)
//!     .namer(namer)
//!     .downloader(downloader)
//!     .build()?;
//!
//! // Capture comment tracks from matching responses
//! engine.register_capture(["*://comment.example.com/*"], parser)?;
//!
//! // Feed one response through a tap
//! let tab_id = TabId::new(7);
//! let url = "https://comment.example.com/12345.xml";
//! if let Some(mut tap) = engine.interceptor().begin_response(
//!     tab_id,
//!     url,
//!     Box::new(|_chunk: &[u8]| { /* forward to the page */ }),
//! )? {
//!     tap.data(b"<comments/>");
//!     tap.stop().await?;
//! }
//!
//! // Keep state consistent as the tab navigates
//! engine.notify(TabNotification::navigated(tab_id, "https://example.com/")).await;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`capture`] | Bounded pass-through response capture |
//! | [`collaborators`] | Contracts for host-supplied collaborators |
//! | [`engine`] | Engine assembly and configuration |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`rpc`] | Exported operations and WebSocket endpoint |
//! | [`store`] | Per-tab capture state |
//! | [`tabs`] | Tab lifecycle tracking |

// ============================================================================
// Modules
// ============================================================================

/// Bounded pass-through response capture.
///
/// Pattern registration, per-response taps, and the all-or-nothing
/// capture buffer.
pub mod capture;

/// Contracts for host-supplied collaborators.
///
/// Parsing, layout, rendering, naming, options, downloads, and the
/// per-tab indicator all live behind these traits.
pub mod collaborators;

/// Engine assembly and configuration.
///
/// Use [`Engine::builder()`] to wire collaborators into an engine.
pub mod engine;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for capture entities.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// RPC export surface.
///
/// The closed operation set, its wire messages, and the WebSocket
/// endpoint serving other execution contexts.
pub mod rpc;

/// Per-tab capture state.
///
/// The tab store, contexts, and capture records.
pub mod store;

/// Tab lifecycle tracking.
///
/// Maps host tab notifications to store mutations.
pub mod tabs;

// ============================================================================
// Re-exports
// ============================================================================

// Capture types
pub use capture::{
    AppendOutcome, CaptureBuffer, DEFAULT_CAPACITY, PassThrough, PatternSet, RequestMeta,
    ResponseInterceptor, ResponseTap, UrlPattern,
};

// Collaborator contracts
pub use collaborators::{
    CaptureHandler, Collaborators, Downloader, FileNamer, Indicator, LayoutEngine, NullIndicator,
    OptionsProvider, TrackRenderer,
};

// Engine types
pub use engine::{Engine, EngineBuilder};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{RecordId, RequestId, TabId};

// RPC types
pub use rpc::{Dispatcher, OperationCall, RpcRequest, RpcResponse, RpcServer};

// Store types
pub use store::{CaptureRecord, RecordMeta, RecordSummary, TabContext, TabStore};

// Tab lifecycle types
pub use tabs::{TabLifecycleWatcher, TabNotification};
