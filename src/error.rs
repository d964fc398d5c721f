//! Error types for the capture engine.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use danmaku_capture::{Result, Error};
//!
//! async fn example(dispatcher: &Dispatcher) -> Result<()> {
//!     let call = OperationCall::parse("listCaptures", &params)?;
//!     let value = dispatcher.dispatch(call).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::Pattern`] |
//! | RPC | [`Error::UnknownMethod`], [`Error::InvalidParams`], [`Error::RecordNotFound`] |
//! | Collaborators | [`Error::OptionsFailed`], [`Error::ParseFailed`], [`Error::LayoutFailed`], [`Error::RenderFailed`], [`Error::NamingFailed`], [`Error::DownloadFailed`] |
//! | External | [`Error::Url`], [`Error::Io`], [`Error::Json`], [`Error::WebSocket`] |
//!
//! Capture overflow is deliberately *not* an error: a response larger than
//! the configured buffer capacity voids that capture silently (see
//! `capture::AppendOutcome`), and no caller ever observes it as a failure.

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;
use url::ParseError as UrlParseError;

use crate::identifiers::{RecordId, TabId};

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when engine configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Invalid URL match pattern.
    ///
    /// Returned when a capture pattern cannot be compiled.
    #[error("Invalid pattern '{pattern}': {message}")]
    Pattern {
        /// The offending pattern.
        pattern: String,
        /// Description of the problem.
        message: String,
    },

    // ========================================================================
    // RPC Errors
    // ========================================================================
    /// Unknown RPC method.
    ///
    /// Returned when a message names an operation outside the exported set.
    /// Always answered as an error response, never a crash.
    #[error("Unknown method: {method}")]
    UnknownMethod {
        /// The unrecognized method name.
        method: String,
    },

    /// Invalid RPC parameters.
    ///
    /// Returned when positional params are missing or mistyped.
    #[error("Invalid params: {message}")]
    InvalidParams {
        /// Description of the invalid parameter.
        message: String,
    },

    /// Capture record not found in the tab.
    ///
    /// Returned by `downloadCapture` before any collaborator is invoked.
    #[error("Record not found: tab={tab_id}, record={record_id}")]
    RecordNotFound {
        /// Tab that was searched.
        tab_id: TabId,
        /// The missing record ID.
        record_id: RecordId,
    },

    // ========================================================================
    // Collaborator Errors
    // ========================================================================
    /// Options collaborator failed.
    #[error("Options retrieval failed: {message}")]
    OptionsFailed {
        /// Error message from the collaborator.
        message: String,
    },

    /// Parser collaborator failed.
    ///
    /// Returned by a capture handler when captured bytes cannot be parsed.
    #[error("Parse failed: {message}")]
    ParseFailed {
        /// Error message from the collaborator.
        message: String,
    },

    /// Layout collaborator failed.
    #[error("Layout failed: {message}")]
    LayoutFailed {
        /// Error message from the collaborator.
        message: String,
    },

    /// Serialization collaborator failed.
    #[error("Render failed: {message}")]
    RenderFailed {
        /// Error message from the collaborator.
        message: String,
    },

    /// Naming collaborator failed.
    #[error("Naming failed: {message}")]
    NamingFailed {
        /// Error message from the collaborator.
        message: String,
    },

    /// Download side effect failed.
    #[error("Download failed: {message}")]
    DownloadFailed {
        /// Error message from the collaborator.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// URL parse error.
    #[error("Invalid URL: {0}")]
    Url(#[from] UrlParseError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid pattern error.
    #[inline]
    pub fn pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Creates an unknown method error.
    #[inline]
    pub fn unknown_method(method: impl Into<String>) -> Self {
        Self::UnknownMethod {
            method: method.into(),
        }
    }

    /// Creates an invalid params error.
    #[inline]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    /// Creates a record not found error.
    #[inline]
    pub fn record_not_found(tab_id: TabId, record_id: impl Into<RecordId>) -> Self {
        Self::RecordNotFound {
            tab_id,
            record_id: record_id.into(),
        }
    }

    /// Creates an options failure error.
    #[inline]
    pub fn options_failed(message: impl Into<String>) -> Self {
        Self::OptionsFailed {
            message: message.into(),
        }
    }

    /// Creates a parse failure error.
    #[inline]
    pub fn parse_failed(message: impl Into<String>) -> Self {
        Self::ParseFailed {
            message: message.into(),
        }
    }

    /// Creates a layout failure error.
    #[inline]
    pub fn layout_failed(message: impl Into<String>) -> Self {
        Self::LayoutFailed {
            message: message.into(),
        }
    }

    /// Creates a render failure error.
    #[inline]
    pub fn render_failed(message: impl Into<String>) -> Self {
        Self::RenderFailed {
            message: message.into(),
        }
    }

    /// Creates a naming failure error.
    #[inline]
    pub fn naming_failed(message: impl Into<String>) -> Self {
        Self::NamingFailed {
            message: message.into(),
        }
    }

    /// Creates a download failure error.
    #[inline]
    pub fn download_failed(message: impl Into<String>) -> Self {
        Self::DownloadFailed {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this error originated at the RPC boundary.
    #[inline]
    #[must_use]
    pub fn is_rpc_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownMethod { .. } | Self::InvalidParams { .. } | Self::RecordNotFound { .. }
        )
    }

    /// Returns `true` if this error came from an external collaborator.
    #[inline]
    #[must_use]
    pub fn is_collaborator_error(&self) -> bool {
        matches!(
            self,
            Self::OptionsFailed { .. }
                | Self::ParseFailed { .. }
                | Self::LayoutFailed { .. }
                | Self::RenderFailed { .. }
                | Self::NamingFailed { .. }
                | Self::DownloadFailed { .. }
        )
    }

    /// Returns the wire error code for this error.
    ///
    /// Used as the `error` field of RPC error responses.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "configuration error",
            Self::Pattern { .. } => "invalid pattern",
            Self::UnknownMethod { .. } => "unknown method",
            Self::InvalidParams { .. } => "invalid params",
            Self::RecordNotFound { .. } => "record not found",
            Self::OptionsFailed { .. } => "options failed",
            Self::ParseFailed { .. } => "parse failed",
            Self::LayoutFailed { .. } => "layout failed",
            Self::RenderFailed { .. } => "render failed",
            Self::NamingFailed { .. } => "naming failed",
            Self::DownloadFailed { .. } => "download failed",
            Self::Url(_) => "invalid url",
            Self::Io(_) => "io error",
            Self::Json(_) => "json error",
            Self::WebSocket(_) => "websocket error",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
