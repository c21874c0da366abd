// crates/formation-core/src/core/record.rs
// ============================================================================
// Module: Formation Record Model
// Description: Hierarchical configuration record, paths, and error slots.
// Purpose: Capture the full session state handed to validators and gates.
// Dependencies: crate::core::identifiers, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The record is the single shared state of a wizard session: the hierarchical
//! configuration values plus the transient per-node slots (validation errors,
//! auxiliary data, auxiliary errors, in-flight flags, dirty marks). Validators,
//! ignore predicates, fetchers, and trail gates all receive an immutable
//! [`Record`] snapshot; mutation goes through the record store boundary.
//! Invariants:
//! - An absent or empty error slot means the node has no validation error.
//! - Transient slots are stripped on persistence and re-defaulted on restore.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::ColumnId;
use crate::core::identifiers::NodeId;

// ============================================================================
// SECTION: Record Paths
// ============================================================================

/// Errors raised while parsing record paths.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// Path contained no segments.
    #[error("record path is empty")]
    Empty,
    /// Path contained an empty segment.
    #[error("record path has an empty segment: {0}")]
    EmptySegment(String),
}

/// Dot-segmented path into the hierarchical configuration record.
///
/// # Invariants
/// - Always holds at least one segment; segments are never empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordPath(Vec<String>);

impl RecordPath {
    /// Parses a dot-segmented path string.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] when the string is empty or has an empty segment.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        if path.is_empty() {
            return Err(PathError::Empty);
        }
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(PathError::EmptySegment(path.to_string()));
        }
        Ok(Self(segments))
    }

    /// Builds a single-segment path from a node identifier.
    #[must_use]
    pub fn from_id(id: &NodeId) -> Self {
        Self(vec![id.as_str().to_string()])
    }

    /// Returns the path segments in order.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for RecordPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl TryFrom<String> for RecordPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, PathError> {
        Self::parse(&value)
    }
}

impl From<RecordPath> for String {
    fn from(path: RecordPath) -> Self {
        path.to_string()
    }
}

// ============================================================================
// SECTION: Validation Error Shapes
// ============================================================================

/// Per-row error slots keyed by column.
///
/// # Invariants
/// - An empty column map means the row has no error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowErrors {
    /// Error messages keyed by the offending column.
    pub columns: BTreeMap<ColumnId, String>,
}

impl RowErrors {
    /// Creates an empty row error slot.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            columns: BTreeMap::new(),
        }
    }

    /// Records an error message for a column, keeping an existing message.
    pub fn insert(&mut self, column: ColumnId, message: impl Into<String>) {
        self.columns.entry(column).or_insert_with(|| message.into());
    }

    /// Returns true when the row has no error.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Error structure for field lists: one slot per row plus a list-level slot.
///
/// # Invariants
/// - `rows` is indexed positionally; slot `i` belongs to row `i`.
/// - `list` carries errors that are not attributable to a single row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListErrors {
    /// List-level error not attributable to a single row.
    pub list: Option<String>,
    /// Per-row error slots, one per row.
    pub rows: Vec<RowErrors>,
}

impl ListErrors {
    /// Creates an empty list error structure sized for `rows` rows.
    #[must_use]
    pub fn sized(rows: usize) -> Self {
        Self {
            list: None,
            rows: vec![RowErrors::new(); rows],
        }
    }

    /// Returns the error slot for a row, if present.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&RowErrors> {
        self.rows.get(index)
    }

    /// Returns true when neither the list slot nor any row slot holds an error.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.list.as_ref().is_none_or(|message| message.is_empty())
            && self.rows.iter().all(RowErrors::is_empty)
    }

    /// Merges another list error structure into this one.
    ///
    /// Row slots are extended positionally; an existing column message wins.
    /// The list-level slot keeps the first non-empty message.
    pub fn merge(&mut self, other: Self) {
        if self.list.as_ref().is_none_or(String::is_empty) {
            self.list = other.list;
        }
        if self.rows.len() < other.rows.len() {
            self.rows.resize_with(other.rows.len(), RowErrors::new);
        }
        for (slot, incoming) in self.rows.iter_mut().zip(other.rows) {
            for (column, message) in incoming.columns {
                slot.insert(column, message);
            }
        }
    }
}

/// Validation error stored in a node's error slot.
///
/// # Invariants
/// - `Field` carries a human-readable message for scalar fields and forms.
/// - `List` carries the structured per-row shape for field lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeError {
    /// Scalar field or form error message.
    Field(String),
    /// Structured field-list errors.
    List(ListErrors),
}

impl NodeError {
    /// Creates a scalar field error.
    #[must_use]
    pub fn field(message: impl Into<String>) -> Self {
        Self::Field(message.into())
    }

    /// Creates a list-level error with empty row slots.
    #[must_use]
    pub fn list_level(message: impl Into<String>) -> Self {
        Self::List(ListErrors {
            list: Some(message.into()),
            rows: Vec::new(),
        })
    }

    /// Returns true when the error carries no message in any slot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Field(message) => message.is_empty(),
            Self::List(errors) => errors.is_empty(),
        }
    }
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(message) => f.write_str(message),
            Self::List(errors) => {
                let rows = errors.rows.iter().filter(|row| !row.is_empty()).count();
                match &errors.list {
                    Some(message) if !message.is_empty() => {
                        write!(f, "{message} ({rows} row errors)")
                    }
                    _ => write!(f, "{rows} row errors"),
                }
            }
        }
    }
}

// ============================================================================
// SECTION: Record
// ============================================================================

/// Full session state snapshot: configuration values plus transient slots.
///
/// # Invariants
/// - `values` is a JSON object tree addressed by [`RecordPath`].
/// - Error, auxiliary, and in-flight slots are keyed by node identifier and
///   are transient: they never survive persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Hierarchical configuration values.
    values: Value,
    /// Validation error slots.
    errors: BTreeMap<NodeId, NodeError>,
    /// Auxiliary data payloads.
    aux_data: BTreeMap<NodeId, Value>,
    /// Auxiliary failure messages.
    aux_errors: BTreeMap<NodeId, String>,
    /// Nodes with a pending validation.
    in_flight: BTreeSet<NodeId>,
    /// Nodes with a pending auxiliary fetch.
    aux_in_flight: BTreeSet<NodeId>,
    /// Nodes the user has touched.
    dirty: BTreeSet<NodeId>,
}

impl Record {
    /// Creates an empty record with an empty object value tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: Value::Object(Map::new()),
            ..Self::default()
        }
    }

    /// Creates a record seeded with the provided value tree.
    #[must_use]
    pub fn with_values(values: Value) -> Self {
        Self {
            values,
            ..Self::default()
        }
    }

    /// Returns the full configuration value tree.
    #[must_use]
    pub const fn values(&self) -> &Value {
        &self.values
    }

    /// Returns the value at a record path, if present.
    #[must_use]
    pub fn value_at(&self, path: &RecordPath) -> Option<&Value> {
        let mut current = &self.values;
        for segment in path.segments() {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Writes a value at a record path, creating intermediate objects.
    ///
    /// A write through a non-object intermediate replaces it with an object.
    pub fn set_value_at(&mut self, path: &RecordPath, value: Value) {
        let mut current = &mut self.values;
        let segments = path.segments();
        for segment in &segments[..segments.len() - 1] {
            if !current.is_object() {
                *current = Value::Object(Map::new());
            }
            let Some(map) = current.as_object_mut() else {
                return;
            };
            current = map.entry(segment.clone()).or_insert(Value::Object(Map::new()));
        }
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        if let Some(map) = current.as_object_mut()
            && let Some(last) = segments.last()
        {
            map.insert(last.clone(), value);
        }
    }

    /// Returns the stored validation error for a node, if any.
    #[must_use]
    pub fn error(&self, id: &NodeId) -> Option<&NodeError> {
        self.errors.get(id)
    }

    /// Returns true when the node has a non-empty stored error.
    #[must_use]
    pub fn has_error(&self, id: &NodeId) -> bool {
        self.errors.get(id).is_some_and(|error| !error.is_empty())
    }

    /// Stores or clears the validation error for a node.
    pub fn set_error(&mut self, id: &NodeId, error: Option<NodeError>) {
        match error {
            Some(error) if !error.is_empty() => {
                self.errors.insert(id.clone(), error);
            }
            _ => {
                self.errors.remove(id);
            }
        }
    }

    /// Returns the auxiliary payload for a node, if any.
    #[must_use]
    pub fn aux(&self, id: &NodeId) -> Option<&Value> {
        self.aux_data.get(id)
    }

    /// Stores or clears the auxiliary payload for a node.
    pub fn set_aux(&mut self, id: &NodeId, payload: Option<Value>) {
        match payload {
            Some(payload) => {
                self.aux_data.insert(id.clone(), payload);
            }
            None => {
                self.aux_data.remove(id);
            }
        }
    }

    /// Returns the auxiliary failure message for a node, if any.
    #[must_use]
    pub fn aux_error(&self, id: &NodeId) -> Option<&str> {
        self.aux_errors.get(id).map(String::as_str)
    }

    /// Stores or clears the auxiliary failure message for a node.
    pub fn set_aux_error(&mut self, id: &NodeId, message: Option<String>) {
        match message {
            Some(message) => {
                self.aux_errors.insert(id.clone(), message);
            }
            None => {
                self.aux_errors.remove(id);
            }
        }
    }

    /// Returns true when the node has a pending validation.
    #[must_use]
    pub fn is_in_flight(&self, id: &NodeId) -> bool {
        self.in_flight.contains(id)
    }

    /// Sets or clears the pending-validation flag for a node.
    pub fn set_in_flight(&mut self, id: &NodeId, in_flight: bool) {
        if in_flight {
            self.in_flight.insert(id.clone());
        } else {
            self.in_flight.remove(id);
        }
    }

    /// Returns true when the node has a pending auxiliary fetch.
    #[must_use]
    pub fn is_aux_in_flight(&self, id: &NodeId) -> bool {
        self.aux_in_flight.contains(id)
    }

    /// Sets or clears the pending-fetch flag for a node.
    pub fn set_aux_in_flight(&mut self, id: &NodeId, in_flight: bool) {
        if in_flight {
            self.aux_in_flight.insert(id.clone());
        } else {
            self.aux_in_flight.remove(id);
        }
    }

    /// Returns true when the user has touched the node.
    #[must_use]
    pub fn is_dirty(&self, id: &NodeId) -> bool {
        self.dirty.contains(id)
    }

    /// Returns the set of touched nodes.
    #[must_use]
    pub const fn dirty(&self) -> &BTreeSet<NodeId> {
        &self.dirty
    }

    /// Marks a node as touched by the user.
    pub fn mark_dirty(&mut self, id: &NodeId) {
        self.dirty.insert(id.clone());
    }
}
