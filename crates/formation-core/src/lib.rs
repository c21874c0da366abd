// crates/formation-core/src/lib.rs
// ============================================================================
// Module: Formation Core
// Description: Dependency-graph validation engine for configuration wizards.
// Purpose: Declare, validate, and orchestrate interdependent configuration
// values with epoch-guarded asynchronous validation.
// Dependencies: async-trait, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Formation Core implements the machinery of an interactive configuration
//! wizard: configuration values are declared as a graph of named nodes with
//! dependencies, defaults, ignore conditions, validators, and auxiliary data
//! fetchers. The engine computes safe evaluation orders, runs possibly
//! asynchronous validation per node, and guarantees that validation triggered
//! by a later edit is never clobbered by validation triggered by an earlier
//! edit of the same node.
//! Invariants:
//! - Node declarations are immutable; per-node bookkeeping lives in the
//!   record store.
//! - Stale asynchronous results are discarded by revision comparison, never
//!   by explicit cancellation.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::ColumnId;
pub use crate::core::ColumnSpec;
pub use crate::core::DeclarationError;
pub use crate::core::FieldSpec;
pub use crate::core::FormSpec;
pub use crate::core::ListErrors;
pub use crate::core::ListSpec;
pub use crate::core::NodeError;
pub use crate::core::NodeId;
pub use crate::core::NodeKind;
pub use crate::core::NodeSpec;
pub use crate::core::PathError;
pub use crate::core::Record;
pub use crate::core::RecordPath;
pub use crate::core::RecordSnapshot;
pub use crate::core::Registry;
pub use crate::core::Revision;
pub use crate::core::RowErrors;
pub use crate::core::SnapshotError;
pub use crate::interfaces::AuxFetcher;
pub use crate::interfaces::CellRule;
pub use crate::interfaces::FetchError;
pub use crate::interfaces::IgnorePredicate;
pub use crate::interfaces::Instrumentation;
pub use crate::interfaces::NoopInstrumentation;
pub use crate::interfaces::RecordStore;
pub use crate::interfaces::Validator;
pub use crate::runtime::Engine;
pub use crate::runtime::EngineConfig;
pub use crate::runtime::EngineError;
pub use crate::runtime::InMemoryRecordStore;
pub use crate::runtime::ScheduleError;

#[cfg(test)]
mod tests;
