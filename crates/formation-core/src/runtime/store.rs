// crates/formation-core/src/runtime/store.rs
// ============================================================================
// Module: Formation In-Memory Record Store
// Description: Mutex-guarded record store for in-process wizard sessions.
// Purpose: Provide the reference RecordStore implementation used by tests
// and single-process deployments.
// Dependencies: crate::core, crate::interfaces, serde_json, std
// ============================================================================

//! ## Overview
//! [`InMemoryRecordStore`] keeps the session record and the per-node revision
//! map behind one mutex. Locks are held only for the duration of a single
//! read or write; the engine never holds them across a suspension point, so
//! the structural mutual-exclusion model of the record is preserved.
//! Invariants:
//! - Revisions start at zero and only move forward.
//! - `restore` re-defaults every transient slot and resets all revisions.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use serde_json::Value;

use crate::core::identifiers::NodeId;
use crate::core::identifiers::Revision;
use crate::core::record::NodeError;
use crate::core::record::Record;
use crate::core::record::RecordPath;
use crate::core::snapshot::RecordSnapshot;
use crate::interfaces::RecordStore;

// ============================================================================
// SECTION: Store State
// ============================================================================

/// Mutable state guarded by the store mutex.
struct StoreState {
    /// Current session record.
    record: Record,
    /// Live revision per node.
    revisions: BTreeMap<NodeId, Revision>,
}

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory record store for single-process sessions.
pub struct InMemoryRecordStore {
    /// Guarded record and revision state.
    state: Mutex<StoreState>,
}

impl InMemoryRecordStore {
    /// Creates a store holding an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::with_record(Record::new())
    }

    /// Creates a store seeded with the provided record.
    #[must_use]
    pub fn with_record(record: Record) -> Self {
        Self {
            state: Mutex::new(StoreState {
                record,
                revisions: BTreeMap::new(),
            }),
        }
    }

    /// Locks the state, recovering from a poisoned mutex.
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn record(&self) -> Record {
        self.lock().record.clone()
    }

    fn write_value(&self, path: &RecordPath, value: Value) {
        self.lock().record.set_value_at(path, value);
    }

    fn set_error(&self, id: &NodeId, error: Option<NodeError>) {
        self.lock().record.set_error(id, error);
    }

    fn set_in_flight(&self, id: &NodeId, in_flight: bool) {
        self.lock().record.set_in_flight(id, in_flight);
    }

    fn set_aux(&self, id: &NodeId, payload: Option<Value>) {
        self.lock().record.set_aux(id, payload);
    }

    fn set_aux_error(&self, id: &NodeId, message: Option<String>) {
        self.lock().record.set_aux_error(id, message);
    }

    fn set_aux_in_flight(&self, id: &NodeId, in_flight: bool) {
        self.lock().record.set_aux_in_flight(id, in_flight);
    }

    fn mark_dirty(&self, id: &NodeId) {
        self.lock().record.mark_dirty(id);
    }

    fn revision(&self, id: &NodeId) -> Revision {
        self.lock().revisions.get(id).copied().unwrap_or(Revision::ZERO)
    }

    fn bump_revision(&self, id: &NodeId) -> Revision {
        let mut state = self.lock();
        let entry = state.revisions.entry(id.clone()).or_insert(Revision::ZERO);
        *entry = entry.next();
        *entry
    }

    fn restore(&self, snapshot: RecordSnapshot) {
        let mut state = self.lock();
        state.record = snapshot.into_record();
        state.revisions.clear();
    }
}
