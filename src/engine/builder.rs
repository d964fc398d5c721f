//! Builder pattern for engine configuration.
//!
//! Provides a fluent API for wiring collaborators and capture settings
//! into an [`Engine`].
//!
//! # Example
//!
//! ```ignore
//! use danmaku_capture::Engine;
//!
//! let engine = Engine::builder()
//!     .capture_capacity(8 * 1024 * 1024)
//!     .indicator(indicator)
//!     .options(options)
//!     .layout(layout)
//!     .renderer(renderer)
//!     .namer(namer)
//!     .downloader(downloader)
//!     .build()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use crate::capture::DEFAULT_CAPACITY;
use crate::collaborators::{
    Collaborators, Downloader, FileNamer, Indicator, LayoutEngine, NullIndicator, OptionsProvider,
    TrackRenderer,
};
use crate::error::{Error, Result};

use super::Engine;

// ============================================================================
// EngineBuilder
// ============================================================================

/// Builder for configuring an [`Engine`] instance.
///
/// Use [`Engine::builder()`] to create a new builder.
#[derive(Default)]
pub struct EngineBuilder {
    /// Capture buffer capacity override.
    capacity: Option<usize>,
    /// Per-tab UI indicator.
    indicator: Option<Arc<dyn Indicator>>,
    /// Persisted user options.
    options: Option<Arc<dyn OptionsProvider>>,
    /// Layout computation.
    layout: Option<Arc<dyn LayoutEngine>>,
    /// Output serialization.
    renderer: Option<Arc<dyn TrackRenderer>>,
    /// File naming.
    namer: Option<Arc<dyn FileNamer>>,
    /// Download side effect.
    downloader: Option<Arc<dyn Downloader>>,
}

// ============================================================================
// EngineBuilder Implementation
// ============================================================================

impl EngineBuilder {
    /// Creates a new engine builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the capture buffer capacity in bytes.
    ///
    /// Defaults to 16 MiB. Each in-flight capture may claim up to this
    /// much memory.
    #[inline]
    #[must_use]
    pub fn capture_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Sets the per-tab UI indicator.
    ///
    /// Defaults to a no-op indicator for headless hosts.
    #[inline]
    #[must_use]
    pub fn indicator(mut self, indicator: Arc<dyn Indicator>) -> Self {
        self.indicator = Some(indicator);
        self
    }

    /// Sets the options collaborator.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: Arc<dyn OptionsProvider>) -> Self {
        self.options = Some(options);
        self
    }

    /// Sets the layout collaborator.
    #[inline]
    #[must_use]
    pub fn layout(mut self, layout: Arc<dyn LayoutEngine>) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Sets the rendering collaborator.
    #[inline]
    #[must_use]
    pub fn renderer(mut self, renderer: Arc<dyn TrackRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Sets the naming collaborator.
    #[inline]
    #[must_use]
    pub fn namer(mut self, namer: Arc<dyn FileNamer>) -> Self {
        self.namer = Some(namer);
        self
    }

    /// Sets the download collaborator.
    #[inline]
    #[must_use]
    pub fn downloader(mut self, downloader: Arc<dyn Downloader>) -> Self {
        self.downloader = Some(downloader);
        self
    }

    /// Builds the engine with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the capacity is zero
    /// - [`Error::Config`] if any export collaborator is missing
    pub fn build(self) -> Result<Engine> {
        let capacity = self.validate_capacity()?;

        let indicator = self.indicator.unwrap_or_else(|| Arc::new(NullIndicator));

        let collaborators = Collaborators {
            options: require(self.options, "options", ".options()")?,
            layout: require(self.layout, "layout", ".layout()")?,
            renderer: require(self.renderer, "renderer", ".renderer()")?,
            namer: require(self.namer, "namer", ".namer()")?,
            downloader: require(self.downloader, "downloader", ".downloader()")?,
        };

        Ok(Engine::new(capacity, indicator, collaborators))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl EngineBuilder {
    /// Validates the capture capacity configuration.
    fn validate_capacity(&self) -> Result<usize> {
        let capacity = self.capacity.unwrap_or(DEFAULT_CAPACITY);

        if capacity == 0 {
            return Err(Error::config(
                "Capture capacity must be non-zero. Every capture would overflow.",
            ));
        }

        Ok(capacity)
    }
}

/// Unwraps a required collaborator with a setter hint.
fn require<T>(value: Option<Arc<T>>, name: &str, setter: &str) -> Result<Arc<T>>
where
    T: ?Sized,
{
    value.ok_or_else(|| {
        Error::config(format!(
            "The {name} collaborator is required. Use {setter} to set it."
        ))
    })
}

// ============================================================================
// Tests
// ============================================================================
