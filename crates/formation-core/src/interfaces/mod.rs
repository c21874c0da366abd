// crates/formation-core/src/interfaces/mod.rs
// ============================================================================
// Module: Formation Interfaces
// Description: Boundary traits for validation, fetching, storage, and telemetry.
// Purpose: Define the contract surfaces used by the Formation engine.
// Dependencies: crate::core, async-trait, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the engine integrates with caller-supplied logic
//! without embedding domain details. Validators and fetchers may suspend;
//! results are written back only when the node's revision still matches the
//! one captured when the work started. Implementations must tolerate repeat
//! invocation with different arguments.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::NodeId;
use crate::core::identifiers::Revision;
use crate::core::record::NodeError;
use crate::core::record::Record;
use crate::core::record::RecordPath;
use crate::core::snapshot::RecordSnapshot;

// ============================================================================
// SECTION: Validators
// ============================================================================

/// Validates one node's projected data against the full record.
///
/// `updated` names the node whose edit triggered this validation, when the
/// validation is part of an incremental propagation pass.
#[async_trait]
pub trait Validator: Send + Sync {
    /// Validates the projected data; `Ok` means the node is valid.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError`] describing why the data is invalid.
    async fn validate(
        &self,
        data: &Value,
        record: &Record,
        updated: Option<&NodeId>,
    ) -> Result<(), NodeError>;
}

/// Synchronous per-column rule applied to every row of a field list.
pub trait CellRule: Send + Sync {
    /// Checks one cell; returns a message when the cell is invalid.
    fn check(&self, value: &Value, row: &Value, record: &Record) -> Option<String>;
}

/// Predicate deciding whether a node is ignored for the current record.
pub type IgnorePredicate = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

// ============================================================================
// SECTION: Auxiliary Fetchers
// ============================================================================

/// Errors raised by auxiliary data fetchers.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Failures degrade to a per-node auxiliary error string; they never abort
///   the enclosing validation pass.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Fetcher reported an error.
    #[error("auxiliary fetch failed: {0}")]
    Failed(String),
    /// Fetched payload exceeds the configured size limit.
    #[error("auxiliary payload too large: {actual_bytes} > {max_bytes}")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual payload size in bytes.
        actual_bytes: usize,
    },
}

/// Fetches externally sourced auxiliary data for a node.
#[async_trait]
pub trait AuxFetcher: Send + Sync {
    /// Resolves the auxiliary payload for the current record.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the payload cannot be fetched.
    async fn fetch(&self, record: &Record) -> Result<Value, FetchError>;
}

// ============================================================================
// SECTION: Record Store
// ============================================================================

/// Record store boundary: snapshot reads, slot writes, revision bookkeeping.
///
/// The engine assumes a single logical thread of mutation; stores provide
/// interior mutability but no cross-await locking. Writes are infallible —
/// the store fronts in-process session state, not external persistence.
pub trait RecordStore: Send + Sync {
    /// Returns a full snapshot of the current record.
    fn record(&self) -> Record;

    /// Writes a configuration value at the given path.
    fn write_value(&self, path: &RecordPath, value: Value);

    /// Stores or clears a node's validation error.
    fn set_error(&self, id: &NodeId, error: Option<NodeError>);

    /// Sets or clears a node's pending-validation flag.
    fn set_in_flight(&self, id: &NodeId, in_flight: bool);

    /// Stores or clears a node's auxiliary payload.
    fn set_aux(&self, id: &NodeId, payload: Option<Value>);

    /// Stores or clears a node's auxiliary failure message.
    fn set_aux_error(&self, id: &NodeId, message: Option<String>);

    /// Sets or clears a node's pending-fetch flag.
    fn set_aux_in_flight(&self, id: &NodeId, in_flight: bool);

    /// Marks a node as touched by the user.
    fn mark_dirty(&self, id: &NodeId);

    /// Returns a node's live revision.
    fn revision(&self, id: &NodeId) -> Revision;

    /// Advances a node's revision and returns the new value.
    fn bump_revision(&self, id: &NodeId) -> Revision;

    /// Replaces the session state from a snapshot, re-defaulting transient
    /// slots and resetting all revisions.
    fn restore(&self, snapshot: RecordSnapshot);
}

// ============================================================================
// SECTION: Instrumentation
// ============================================================================

/// Observability hooks emitted by the engine.
///
/// The interface is intentionally dependency-light so downstream deployments
/// can plug in their own counters or structured logging without redesign.
/// Every hook has a no-op default body.
pub trait Instrumentation: Send + Sync {
    /// An edit left its own node invalid; propagation was skipped.
    fn invalid_edit(&self, id: &NodeId) {
        let _ = id;
    }

    /// A completed validation or fetch was discarded as stale.
    fn stale_result_discarded(&self, id: &NodeId, epoch: Revision) {
        let _ = (id, epoch);
    }

    /// A dependent node failed during incremental propagation; suppressed.
    fn propagation_failure(&self, id: &NodeId, message: &str) {
        let _ = (id, message);
    }

    /// A node's validation settled with the given validity.
    fn node_settled(&self, id: &NodeId, valid: bool) {
        let _ = (id, valid);
    }
}

/// Instrumentation sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInstrumentation;

impl Instrumentation for NoopInstrumentation {}
