//! Per-tab capture state types.

use std::collections::HashMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identifiers::{RecordId, TabId};

// ============================================================================
// RecordMeta
// ============================================================================

/// Descriptive metadata of a capture record.
///
/// `name` is the display name used for listings and download file names;
/// everything else the parser collaborator attaches travels in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordMeta {
    /// Display name of the track.
    pub name: String,

    /// Additional parser-supplied fields.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl RecordMeta {
    /// Creates metadata with a display name and no extra fields.
    #[inline]
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extra: HashMap::new(),
        }
    }
}

// ============================================================================
// CaptureRecord
// ============================================================================

/// One parsed unit of captured content associated with a tab.
///
/// Created only by a successful capture-and-parse cycle. Immutable once
/// stored, except for `layout`, which is computed lazily when the record
/// is exported and cached here.
#[derive(Debug, Clone)]
pub struct CaptureRecord {
    /// Identifier, unique within the owning tab.
    pub id: RecordId,

    /// Descriptive metadata.
    pub meta: RecordMeta,

    /// Opaque parsed payload produced by the parser collaborator.
    pub content: Value,

    /// Derived presentation data, filled in at export time only.
    pub layout: Option<Value>,
}

impl CaptureRecord {
    /// Creates a record with no layout computed yet.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<RecordId>, meta: RecordMeta, content: Value) -> Self {
        Self {
            id: id.into(),
            meta,
            content,
            layout: None,
        }
    }

    /// Returns the `{id, meta}` projection used by listings.
    ///
    /// Raw `content` is never exposed through this path.
    #[inline]
    #[must_use]
    pub fn summary(&self) -> RecordSummary {
        RecordSummary {
            id: self.id.clone(),
            meta: self.meta.clone(),
        }
    }
}

// ============================================================================
// RecordSummary
// ============================================================================

/// Projection of a record for `listCaptures` responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSummary {
    /// Record identifier.
    pub id: RecordId,

    /// Descriptive metadata.
    pub meta: RecordMeta,
}

// ============================================================================
// TabContext
// ============================================================================

/// Per-tab capture state: the records captured for the tab plus free-form
/// auxiliary metadata.
///
/// Created lazily on first reference and owned exclusively by the store;
/// no other component holds a separate copy of `records`.
#[derive(Debug)]
pub struct TabContext {
    /// Owning tab.
    pub tab_id: TabId,

    /// Captured records in completion order.
    pub records: Vec<CaptureRecord>,

    /// Auxiliary per-tab data. Survives same-tab navigation.
    pub meta_info: FxHashMap<String, Value>,
}

impl TabContext {
    /// Creates an empty context for a tab.
    #[inline]
    #[must_use]
    pub fn new(tab_id: TabId) -> Self {
        Self {
            tab_id,
            records: Vec::new(),
            meta_info: FxHashMap::default(),
        }
    }

    /// Appends a record. Records keep insertion (completion) order.
    #[inline]
    pub fn push_record(&mut self, record: CaptureRecord) {
        self.records.push(record);
    }

    /// Finds a record by ID.
    #[inline]
    #[must_use]
    pub fn find_record(&self, id: &RecordId) -> Option<&CaptureRecord> {
        self.records.iter().find(|record| record.id == *id)
    }

    /// Finds a record by ID for mutation (layout caching).
    #[inline]
    #[must_use]
    pub fn find_record_mut(&mut self, id: &RecordId) -> Option<&mut CaptureRecord> {
        self.records.iter_mut().find(|record| record.id == *id)
    }

    /// Returns `{id, meta}` projections of all records, in order.
    #[must_use]
    pub fn summaries(&self) -> Vec<RecordSummary> {
        self.records.iter().map(CaptureRecord::summary).collect()
    }

    /// Empties the record list, keeping `meta_info` intact.
    #[inline]
    pub fn clear_records(&mut self) {
        self.records.clear();
    }
}

// ============================================================================
// Tests
// ============================================================================
