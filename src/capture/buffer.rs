//! Bounded all-or-nothing capture buffer.

// ============================================================================
// Constants
// ============================================================================

/// Default capture capacity: 16 MiB, enough for any realistic track payload.
pub const DEFAULT_CAPACITY: usize = 1 << 24;

// ============================================================================
// AppendOutcome
// ============================================================================

/// Result of appending a chunk to a [`CaptureBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Chunk copied; the capture is still complete so far.
    Stored,

    /// Capacity exceeded now or earlier; the capture is void.
    Overflowed,
}

// ============================================================================
// CaptureBuffer
// ============================================================================

/// Fixed-capacity accumulator for one in-flight response.
///
/// Capture is binary: either the full response fits within `capacity`, or
/// nothing is kept. The first chunk that would exceed capacity marks the
/// buffer overflowed and releases everything copied so far; later appends
/// are skipped without copying. A partial payload would be semantically
/// useless to the parser, so losing oversized responses outright is the
/// intended trade-off.
///
/// One buffer per request; never shared, so no synchronization is needed.
#[derive(Debug)]
pub struct CaptureBuffer {
    data: Vec<u8>,
    capacity: usize,
    overflowed: bool,
}

impl CaptureBuffer {
    /// Creates a buffer with the given capacity in bytes.
    ///
    /// Memory is claimed as chunks arrive, not up front.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            data: Vec::new(),
            capacity,
            overflowed: false,
        }
    }

    /// Creates a buffer with [`DEFAULT_CAPACITY`].
    #[inline]
    #[must_use]
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Appends a chunk.
    ///
    /// Once overflowed, stays overflowed; the skip costs nothing per chunk.
    pub fn append(&mut self, chunk: &[u8]) -> AppendOutcome {
        if self.overflowed {
            return AppendOutcome::Overflowed;
        }

        if self.data.len() + chunk.len() > self.capacity {
            self.overflowed = true;
            // Release everything copied so far; the capture is lost.
            self.data = Vec::new();
            return AppendOutcome::Overflowed;
        }

        self.data.extend_from_slice(chunk);
        AppendOutcome::Stored
    }

    /// Consumes the buffer, returning the exact captured bytes.
    ///
    /// Returns `None` if the capture overflowed. The returned vector holds
    /// exactly the delivered bytes, no trailing unused capacity.
    #[must_use]
    pub fn finalize(self) -> Option<Vec<u8>> {
        if self.overflowed { None } else { Some(self.data) }
    }

    /// Returns `true` if the capture is void.
    #[inline]
    #[must_use]
    pub fn is_overflowed(&self) -> bool {
        self.overflowed
    }

    /// Number of bytes copied so far (0 after overflow).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if nothing has been copied.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The configured capacity in bytes.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

// ============================================================================
// Tests
// ============================================================================
