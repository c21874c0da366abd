// crates/formation-core/src/core/snapshot.rs
// ============================================================================
// Module: Formation Record Snapshots
// Description: Persistable projection of a wizard session record.
// Purpose: Strip transient slots for persistence and re-default them on restore.
// Dependencies: crate::core::{identifiers, record}, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A snapshot is the durable subset of a session: the dirty-node set and the
//! configuration values. Transient slots (errors, auxiliary data, auxiliary
//! errors, in-flight flags) are stripped on capture and re-created empty on
//! restore; a restored session re-derives them with a full-graph validation.
//! Invariants:
//! - Snapshot files are UTF-8 JSON bounded by [`MAX_SNAPSHOT_BYTES`].
//! - Loading fails closed on oversized, non-UTF-8, or malformed input.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::NodeId;
use crate::core::record::Record;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum snapshot file size accepted on load, in bytes.
pub const MAX_SNAPSHOT_BYTES: usize = 1_048_576;

// ============================================================================
// SECTION: Snapshot Errors
// ============================================================================

/// Errors raised while persisting or restoring snapshots.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Snapshot I/O failed.
    #[error("snapshot io error: {0}")]
    Io(String),
    /// Snapshot file exceeds the size limit.
    #[error("snapshot file exceeds size limit: {actual_bytes} > {max_bytes}")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual file size in bytes.
        actual_bytes: usize,
    },
    /// Snapshot file is not valid UTF-8.
    #[error("snapshot file must be utf-8")]
    NotUtf8,
    /// Snapshot contents failed to parse.
    #[error("snapshot parse failure: {0}")]
    Malformed(String),
}

// ============================================================================
// SECTION: Record Snapshot
// ============================================================================

/// Persistable projection of a session record.
///
/// # Invariants
/// - Holds only durable state: dirty marks and configuration values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSnapshot {
    /// Nodes the user has touched.
    pub dirty: BTreeSet<NodeId>,
    /// Hierarchical configuration values.
    pub values: Value,
}

impl RecordSnapshot {
    /// Captures the durable subset of a record, stripping transient slots.
    #[must_use]
    pub fn capture(record: &Record) -> Self {
        Self {
            dirty: record.dirty().clone(),
            values: record.values().clone(),
        }
    }

    /// Rebuilds a session record with transient slots re-defaulted.
    #[must_use]
    pub fn into_record(self) -> Record {
        let mut record = Record::with_values(self.values);
        for id in &self.dirty {
            record.mark_dirty(id);
        }
        record
    }

    /// Loads a snapshot from a JSON file, enforcing the input guards.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] when the file is unreadable, oversized,
    /// non-UTF-8, or malformed.
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let metadata = fs::metadata(path).map_err(|error| SnapshotError::Io(error.to_string()))?;
        let actual_bytes = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        if actual_bytes > MAX_SNAPSHOT_BYTES {
            return Err(SnapshotError::TooLarge {
                max_bytes: MAX_SNAPSHOT_BYTES,
                actual_bytes,
            });
        }
        let bytes = fs::read(path).map_err(|error| SnapshotError::Io(error.to_string()))?;
        let text = String::from_utf8(bytes).map_err(|_| SnapshotError::NotUtf8)?;
        serde_json::from_str(&text).map_err(|error| SnapshotError::Malformed(error.to_string()))
    }

    /// Saves the snapshot to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] when serialization or writing fails.
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let text = serde_json::to_string_pretty(self)
            .map_err(|error| SnapshotError::Malformed(error.to_string()))?;
        fs::write(path, text).map_err(|error| SnapshotError::Io(error.to_string()))
    }
}

impl From<&Record> for RecordSnapshot {
    fn from(record: &Record) -> Self {
        Self::capture(record)
    }
}
