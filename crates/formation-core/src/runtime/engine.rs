// crates/formation-core/src/runtime/engine.rs
// ============================================================================
// Module: Formation Validation Engine
// Description: Update propagation, node validation, and auxiliary fetching.
// Purpose: Orchestrate epoch-guarded validation over the dependency graph.
// Dependencies: crate::core, crate::interfaces, crate::runtime::schedule,
// serde_json
// ============================================================================

//! ## Overview
//! The engine drives every mutation of the wizard session. An edit bumps the
//! node's revision, writes the value, validates the node under that captured
//! epoch, and — only when the edit left the node valid — revalidates the
//! transitive dependents one at a time. Results arriving under a superseded
//! epoch are discarded without writing back, which is the engine's only form
//! of mutual exclusion.
//! Invariants:
//! - No lock is held across a suspension point.
//! - An older edit's result can never overwrite a newer edit's result for the
//!   same node.
//! - Failures inside dependent revalidation are reported through
//!   instrumentation and suppressed; the triggering edit is not rolled back.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::ColumnId;
use crate::core::identifiers::NodeId;
use crate::core::identifiers::Revision;
use crate::core::node::ListSpec;
use crate::core::node::NodeKind;
use crate::core::node::NodeSpec;
use crate::core::record::ListErrors;
use crate::core::record::NodeError;
use crate::core::record::Record;
use crate::core::registry::Registry;
use crate::core::snapshot::RecordSnapshot;
use crate::interfaces::FetchError;
use crate::interfaces::Instrumentation;
use crate::interfaces::NoopInstrumentation;
use crate::interfaces::RecordStore;
use crate::runtime::schedule::ScheduleError;
use crate::runtime::schedule::evaluation_order;

// ============================================================================
// SECTION: Engine Configuration
// ============================================================================

/// Default bound on the number of rows a field list may hold.
pub const DEFAULT_MAX_LIST_ROWS: usize = 128;

/// Default bound on auxiliary payload size, in serialized bytes.
pub const DEFAULT_MAX_AUX_BYTES: usize = 1_048_576;

/// Engine limits applied to untrusted growth.
///
/// # Invariants
/// - Limits are enforced fail-closed: exceeding input is refused, never
///   truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum number of rows a field list may hold.
    pub max_list_rows: usize,
    /// Maximum auxiliary payload size in serialized bytes.
    pub max_aux_bytes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_list_rows: DEFAULT_MAX_LIST_ROWS,
            max_aux_bytes: DEFAULT_MAX_AUX_BYTES,
        }
    }
}

// ============================================================================
// SECTION: Engine Errors
// ============================================================================

/// Fatal engine errors indicating misuse of the declared graph.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - These never surface to end users; expected validation outcomes live in
///   the record's error slots instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Identifier was never registered.
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),
    /// Operation requires a field or list node.
    #[error("node has no value slot: {0}")]
    NotAField(NodeId),
    /// Operation requires a field-list node.
    #[error("node is not a field list: {0}")]
    NotAList(NodeId),
    /// Row index out of bounds.
    #[error("row index out of bounds: {index} (rows: {rows})")]
    RowOutOfBounds {
        /// Requested row index.
        index: usize,
        /// Number of rows present.
        rows: usize,
    },
    /// Appending would exceed the configured row limit.
    #[error("row limit reached: {limit}")]
    RowLimit {
        /// Configured row limit.
        limit: usize,
    },
    /// Full-graph scheduling failed.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Validation engine orchestrating one wizard session.
pub struct Engine<S: RecordStore> {
    /// Declared node graph.
    registry: Arc<Registry>,
    /// Session state store.
    store: S,
    /// Engine limits.
    config: EngineConfig,
    /// Observability sink.
    instrumentation: Arc<dyn Instrumentation>,
}

impl<S: RecordStore> Engine<S> {
    /// Creates an engine over the given registry and store.
    #[must_use]
    pub fn new(registry: Arc<Registry>, store: S, config: EngineConfig) -> Self {
        Self {
            registry,
            store,
            config,
            instrumentation: Arc::new(NoopInstrumentation),
        }
    }

    /// Replaces the instrumentation sink.
    #[must_use]
    pub fn with_instrumentation(mut self, instrumentation: impl Instrumentation + 'static) -> Self {
        self.instrumentation = Arc::new(instrumentation);
        self
    }

    /// Returns the registry backing this engine.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns the record store backing this engine.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Returns a snapshot of the current session record.
    #[must_use]
    pub fn record(&self) -> Record {
        self.store.record()
    }

    /// Resolves a declaration or fails with the unknown-node error.
    fn require(&self, id: &NodeId) -> Result<Arc<NodeSpec>, EngineError> {
        self.registry
            .node(id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownNode(id.clone()))
    }

    /// Returns a node's aggregate validity against the current record.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownNode`] for unregistered identifiers.
    pub fn is_valid(&self, id: &NodeId) -> Result<bool, EngineError> {
        self.require(id)?;
        Ok(self.registry.is_valid(id, &self.store.record()))
    }

    /// Returns a node's aggregate in-flight status against the current record.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownNode`] for unregistered identifiers.
    pub fn in_flight(&self, id: &NodeId) -> Result<bool, EngineError> {
        self.require(id)?;
        Ok(self.registry.in_flight(id, &self.store.record()))
    }

    /// Projects a node's current data from the current record.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownNode`] for unregistered identifiers.
    pub fn data_of(&self, id: &NodeId) -> Result<Value, EngineError> {
        self.require(id)?;
        Ok(self
            .registry
            .data_of(id, &self.store.record())
            .unwrap_or(Value::Null))
    }

    // ------------------------------------------------------------------
    // Edits
    // ------------------------------------------------------------------

    /// Updates a field's value and propagates validation to its dependents.
    ///
    /// Returns whether the edited node itself validated; dependents are only
    /// revalidated when it did.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] for unregistered identifiers or nodes without
    /// a value slot.
    pub async fn update_field(&self, id: &NodeId, value: Value) -> Result<bool, EngineError> {
        let spec = self.require(id)?;
        if spec.value_path().is_none() {
            return Err(EngineError::NotAField(id.clone()));
        }
        self.apply_edit(&spec, value).await
    }

    /// Appends a row of column defaults to a field list.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] for unregistered identifiers, non-list nodes,
    /// or when the configured row limit is reached.
    pub async fn append_row(&self, id: &NodeId) -> Result<bool, EngineError> {
        let spec = self.require(id)?;
        let list = Self::require_list(&spec)?;
        let mut rows = self.current_rows(&spec, list);
        if rows.len() >= self.config.max_list_rows {
            return Err(EngineError::RowLimit {
                limit: self.config.max_list_rows,
            });
        }
        rows.push(list.default_row());
        self.apply_edit(&spec, Value::Array(rows)).await
    }

    /// Removes a row from a field list.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] for unregistered identifiers, non-list nodes,
    /// or out-of-range indices.
    pub async fn remove_row(&self, id: &NodeId, index: usize) -> Result<bool, EngineError> {
        let spec = self.require(id)?;
        let list = Self::require_list(&spec)?;
        let mut rows = self.current_rows(&spec, list);
        if index >= rows.len() {
            return Err(EngineError::RowOutOfBounds {
                index,
                rows: rows.len(),
            });
        }
        rows.remove(index);
        self.apply_edit(&spec, Value::Array(rows)).await
    }

    /// Updates one cell of a field-list row.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] for unregistered identifiers, non-list nodes,
    /// or out-of-range indices.
    pub async fn update_cell(
        &self,
        id: &NodeId,
        index: usize,
        column: &ColumnId,
        value: Value,
    ) -> Result<bool, EngineError> {
        let spec = self.require(id)?;
        let list = Self::require_list(&spec)?;
        let mut rows = self.current_rows(&spec, list);
        let Some(row) = rows.get_mut(index) else {
            return Err(EngineError::RowOutOfBounds {
                index,
                rows: rows.len(),
            });
        };
        if let Some(object) = row.as_object_mut() {
            object.insert(column.as_str().to_string(), value);
        }
        self.apply_edit(&spec, Value::Array(rows)).await
    }

    /// Resolves the list payload of a declaration.
    fn require_list(spec: &NodeSpec) -> Result<&ListSpec, EngineError> {
        match spec.kind() {
            NodeKind::List(list) => Ok(list),
            NodeKind::Field(_) | NodeKind::Form(_) => {
                Err(EngineError::NotAList(spec.id().clone()))
            }
        }
    }

    /// Reads the current row array of a list, falling back to its default.
    fn current_rows(&self, spec: &NodeSpec, list: &ListSpec) -> Vec<Value> {
        let record = self.store.record();
        spec.value_path()
            .and_then(|path| record.value_at(path))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_else(|| match list.default_value() {
                Value::Array(rows) => rows,
                _ => Vec::new(),
            })
    }

    /// Shared edit protocol: bump revision, write, validate, propagate.
    async fn apply_edit(&self, spec: &Arc<NodeSpec>, value: Value) -> Result<bool, EngineError> {
        let id = spec.id().clone();
        let epoch = self.store.bump_revision(&id);
        self.store.mark_dirty(&id);
        if let Some(path) = spec.value_path() {
            self.store.write_value(path, value);
        }
        let valid = self.validate_node(&id, Some(&id), epoch).await?;
        if !valid {
            self.instrumentation.invalid_edit(&id);
            return Ok(false);
        }
        for dependent in self.registry.transitive_dependents(&id) {
            let dependent_epoch = self.store.revision(&dependent);
            if let Err(error) = self.fetch_aux(&dependent, dependent_epoch).await {
                self.instrumentation
                    .propagation_failure(&dependent, &error.to_string());
                continue;
            }
            if let Err(error) = self.validate_node(&dependent, Some(&id), dependent_epoch).await {
                self.instrumentation
                    .propagation_failure(&dependent, &error.to_string());
            }
        }
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Validates one node under a captured epoch.
    ///
    /// The node's data projection and the record snapshot are taken before
    /// the validator runs; the result is written back only when the node's
    /// live revision still equals `epoch`. Returns the node's validity after
    /// the call settles.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownNode`] for unregistered identifiers.
    pub async fn validate_node(
        &self,
        id: &NodeId,
        updated: Option<&NodeId>,
        epoch: Revision,
    ) -> Result<bool, EngineError> {
        let spec = self.require(id)?;
        self.store.set_in_flight(id, true);
        let record = self.store.record();
        let data = self.registry.data_of(id, &record).unwrap_or(Value::Null);

        let cell_errors = match spec.kind() {
            NodeKind::List(list) => Some(Self::run_cell_rules(list, &data, &record)),
            NodeKind::Field(_) | NodeKind::Form(_) => None,
        };
        let outcome = match spec.validator() {
            None => Ok(()),
            Some(validator) => validator.validate(&data, &record, updated).await,
        };

        if self.store.revision(id) != epoch {
            self.instrumentation.stale_result_discarded(id, epoch);
            return Ok(self.registry.is_valid(id, &self.store.record()));
        }

        let error = Self::merge_outcome(cell_errors, outcome);
        self.store.set_error(id, error);
        self.store.set_in_flight(id, false);
        let valid = self.registry.is_valid(id, &self.store.record());
        self.instrumentation.node_settled(id, valid);
        Ok(valid)
    }

    /// Applies declared cell rules to every row of a list projection.
    fn run_cell_rules(list: &ListSpec, data: &Value, record: &Record) -> ListErrors {
        let rows = data.as_array().map_or(&[] as &[Value], Vec::as_slice);
        let mut errors = ListErrors::sized(rows.len());
        for (index, row) in rows.iter().enumerate() {
            for (column, column_spec) in list.columns() {
                let Some(rule) = column_spec.rule() else {
                    continue;
                };
                let cell = row
                    .as_object()
                    .and_then(|object| object.get(column.as_str()))
                    .unwrap_or(&Value::Null);
                if let Some(message) = rule.check(cell, row, record)
                    && let Some(slot) = errors.rows.get_mut(index)
                {
                    slot.insert(column.clone(), message);
                }
            }
        }
        errors
    }

    /// Merges cell-rule errors with the validator outcome into one slot value.
    fn merge_outcome(
        cell_errors: Option<ListErrors>,
        outcome: Result<(), NodeError>,
    ) -> Option<NodeError> {
        match cell_errors {
            None => outcome.err().filter(|error| !error.is_empty()),
            Some(mut errors) => {
                match outcome {
                    Ok(()) => {}
                    Err(NodeError::List(incoming)) => errors.merge(incoming),
                    Err(NodeError::Field(message)) => {
                        if errors.list.as_ref().is_none_or(String::is_empty) {
                            errors.list = Some(message);
                        }
                    }
                }
                if errors.is_empty() {
                    None
                } else {
                    Some(NodeError::List(errors))
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Auxiliary data
    // ------------------------------------------------------------------

    /// Fetches a node's auxiliary data under a captured epoch.
    ///
    /// Resolves immediately when the node declares no fetcher or when any
    /// registered effective dependency is currently invalid. Failures degrade
    /// to the node's auxiliary-error slot and never abort the enclosing pass.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownNode`] for unregistered identifiers.
    pub async fn fetch_aux(&self, id: &NodeId, epoch: Revision) -> Result<(), EngineError> {
        let spec = self.require(id)?;
        let Some(fetcher) = spec.aux_fetcher() else {
            return Ok(());
        };
        let record = self.store.record();
        let deferred = self
            .registry
            .effective_dependencies(id)
            .iter()
            .any(|dependency| {
                self.registry.contains(dependency) && !self.registry.is_valid(dependency, &record)
            });
        if deferred {
            return Ok(());
        }

        self.store.set_aux_in_flight(id, true);
        let outcome = fetcher.fetch(&record).await.and_then(|payload| {
            let actual_bytes = serde_json::to_vec(&payload).map_or(usize::MAX, |bytes| bytes.len());
            if actual_bytes > self.config.max_aux_bytes {
                Err(FetchError::TooLarge {
                    max_bytes: self.config.max_aux_bytes,
                    actual_bytes,
                })
            } else {
                Ok(payload)
            }
        });

        if self.store.revision(id) == epoch {
            match outcome {
                Ok(payload) => {
                    self.store.set_aux(id, Some(payload));
                    self.store.set_aux_error(id, None);
                }
                Err(error) => {
                    self.store.set_aux(id, None);
                    self.store.set_aux_error(id, Some(error.to_string()));
                }
            }
        } else {
            self.instrumentation.stale_result_discarded(id, epoch);
        }
        self.store.set_aux_in_flight(id, false);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Full-graph passes
    // ------------------------------------------------------------------

    /// Revalidates the entire graph in dependency order.
    ///
    /// Every registered node is visited exactly once, strictly after its
    /// dependencies, each visit refreshing auxiliary data and validity.
    /// Completion is signalled by the returned future resolving.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Schedule`] when the graph has an unregistered
    /// dependency or a cycle.
    pub async fn validate_all(&self) -> Result<(), EngineError> {
        let order = evaluation_order(&self.registry)?;
        for id in order {
            let epoch = self.store.revision(&id);
            self.fetch_aux(&id, epoch).await?;
            self.validate_node(&id, None, epoch).await?;
        }
        Ok(())
    }

    /// Restores a persisted snapshot and revalidates the entire graph.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Schedule`] when the graph has an unregistered
    /// dependency or a cycle.
    pub async fn restore(&self, snapshot: RecordSnapshot) -> Result<(), EngineError> {
        self.store.restore(snapshot);
        self.validate_all().await
    }
}
