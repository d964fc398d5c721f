//! Type-safe identifiers for capture entities.
//!
//! Newtype wrappers prevent mixing incompatible IDs at compile time:
//! a [`TabId`] never stands in for a [`RecordId`], and RPC message
//! correlation uses its own [`RequestId`].

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// TabId
// ============================================================================

/// Identifier of a browser tab.
///
/// Stable for the tab's navigation session; the correlation key for
/// captures, lifecycle notifications, and RPC operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(u32);

impl TabId {
    /// Creates a tab ID from the host's raw value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw numeric value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TabId {
    #[inline]
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

// ============================================================================
// RecordId
// ============================================================================

/// Identifier of a capture record, unique within its tab.
///
/// Assigned by the parser collaborator (e.g. a track identifier extracted
/// from the response), so it is an opaque string rather than a number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Creates a record ID.
    #[inline]
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the ID as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    #[inline]
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for RecordId {
    #[inline]
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

// ============================================================================
// RequestId
// ============================================================================

/// Identifier correlating an RPC request with its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a fresh random request ID.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the nil request ID (all zeros).
    #[inline]
    #[must_use]
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_id_roundtrip() {
        let id = TabId::new(7);
        assert_eq!(id.raw(), 7);
        assert_eq!(id.to_string(), "7");

        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "7");
        let back: TabId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }

    #[test]
    fn test_record_id_from_str() {
        let id = RecordId::from("track-1");
        assert_eq!(id.as_str(), "track-1");
        assert_eq!(id, RecordId::new("track-1".to_string()));
    }

    #[test]
    fn test_request_id_unique() {
        let a = RequestId::generate();
        let b = RequestId::generate();
        assert_ne!(a, b);
        assert_ne!(a, RequestId::nil());
    }
}
