// crates/formation-core/src/core/registry.rs
// ============================================================================
// Module: Formation Dependency Registry
// Description: Registry of declared nodes and their dependency edges.
// Purpose: Enforce declaration invariants and project graph-wide state.
// Dependencies: crate::core::{identifiers, node, record}, thiserror
// ============================================================================

//! ## Overview
//! The registry owns the declared node graph for one application instance:
//! node declarations keyed by identifier, reverse dependency edges, and
//! child-to-form ownership. It is constructed explicitly and passed by
//! reference into the engine and trail gates; there is no ambient global
//! state. Declaration errors are fatal and typed — they indicate programming
//! errors in the field declarations, never user input problems.
//! Invariants:
//! - Every node identifier registers at most once; forms and fields share
//!   one namespace.
//! - Dependencies may reference identifiers registered later; the full id
//!   set is checked on the first full-graph validation pass.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::VecDeque;
use std::sync::Arc;

use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::NodeId;
use crate::core::node::NodeKind;
use crate::core::node::NodeSpec;
use crate::core::record::Record;

// ============================================================================
// SECTION: Declaration Errors
// ============================================================================

/// Fatal errors raised while declaring nodes.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    /// Identifier registered twice.
    #[error("node already registered: {0}")]
    DuplicateNode(NodeId),
    /// Two fields declared the same record path.
    #[error("record path already claimed: {path} (by {existing})")]
    PathCollision {
        /// Colliding record path.
        path: String,
        /// Node that already claimed the path.
        existing: NodeId,
    },
    /// A child node was claimed by two forms.
    #[error("form child already owned: {child} (by {owner})")]
    FormChildMultiplyOwned {
        /// Child claimed twice.
        child: NodeId,
        /// Form that already owns the child.
        owner: NodeId,
    },
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Explicit registry of node declarations and dependency edges.
///
/// # Invariants
/// - `dependents` holds reverse edges: for every declared dependency `d` of
///   node `n`, `dependents[d]` contains `n`.
/// - `owners` maps each form child to its owning form.
#[derive(Default)]
pub struct Registry {
    /// Node declarations keyed by identifier.
    nodes: BTreeMap<NodeId, Arc<NodeSpec>>,
    /// Reverse dependency edges: nodes that depend on the key.
    dependents: BTreeMap<NodeId, BTreeSet<NodeId>>,
    /// Child-to-form ownership.
    owners: BTreeMap<NodeId, NodeId>,
    /// Claimed record paths for collision detection.
    paths: BTreeMap<String, NodeId>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a node declaration and wires its dependency edges.
    ///
    /// # Errors
    ///
    /// Returns [`DeclarationError`] on duplicate identifiers, record path
    /// collisions, or multiply-owned form children.
    pub fn register(&mut self, spec: NodeSpec) -> Result<NodeId, DeclarationError> {
        let id = spec.id().clone();
        if self.nodes.contains_key(&id) {
            return Err(DeclarationError::DuplicateNode(id));
        }
        if let NodeKind::Form(form) = spec.kind() {
            for child in &form.children {
                if let Some(owner) = self.owners.get(child) {
                    return Err(DeclarationError::FormChildMultiplyOwned {
                        child: child.clone(),
                        owner: owner.clone(),
                    });
                }
            }
        }
        if let Some(path) = spec.value_path() {
            let key = path.to_string();
            if let Some(existing) = self.paths.get(&key) {
                return Err(DeclarationError::PathCollision {
                    path: key,
                    existing: existing.clone(),
                });
            }
            self.paths.insert(key, id.clone());
        }
        for child in spec.children() {
            self.owners.insert(child.clone(), id.clone());
        }
        for dependency in Self::effective_dependencies_of(&spec) {
            self.dependents.entry(dependency).or_default().insert(id.clone());
        }
        self.nodes.insert(id.clone(), Arc::new(spec));
        Ok(id)
    }

    /// Returns the declaration for a node, if registered.
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&Arc<NodeSpec>> {
        self.nodes.get(id)
    }

    /// Returns true when the identifier is registered.
    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Returns the number of registered nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true when no nodes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over registered node identifiers in sorted order.
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    /// Iterates over registered node declarations in identifier order.
    pub fn nodes(&self) -> impl Iterator<Item = &Arc<NodeSpec>> {
        self.nodes.values()
    }

    /// Returns the form owning a node, if any.
    #[must_use]
    pub fn owner_of(&self, id: &NodeId) -> Option<&NodeId> {
        self.owners.get(id)
    }

    /// Clears every declaration; used for test isolation.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.dependents.clear();
        self.owners.clear();
        self.paths.clear();
    }

    // ------------------------------------------------------------------
    // Dependency queries
    // ------------------------------------------------------------------

    /// Computes a declaration's effective dependencies: extras plus children.
    fn effective_dependencies_of(spec: &NodeSpec) -> BTreeSet<NodeId> {
        let mut dependencies = spec.dependencies().clone();
        dependencies.extend(spec.children().iter().cloned());
        dependencies
    }

    /// Returns the effective dependency set of a registered node.
    #[must_use]
    pub fn effective_dependencies(&self, id: &NodeId) -> BTreeSet<NodeId> {
        self.nodes
            .get(id)
            .map(|spec| Self::effective_dependencies_of(spec))
            .unwrap_or_default()
    }

    /// Returns the direct dependents of a node.
    #[must_use]
    pub fn dependents_of(&self, id: &NodeId) -> BTreeSet<NodeId> {
        self.dependents.get(id).cloned().unwrap_or_default()
    }

    /// Computes the deduplicated transitive-dependent closure of a node in
    /// breadth-first order, excluding the node itself.
    #[must_use]
    pub fn transitive_dependents(&self, id: &NodeId) -> Vec<NodeId> {
        let mut seen: BTreeSet<NodeId> = BTreeSet::new();
        let mut order: Vec<NodeId> = Vec::new();
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        queue.push_back(id.clone());
        while let Some(current) = queue.pop_front() {
            for dependent in self.dependents_of(&current) {
                if dependent != *id && seen.insert(dependent.clone()) {
                    order.push(dependent.clone());
                    queue.push_back(dependent);
                }
            }
        }
        order
    }

    // ------------------------------------------------------------------
    // Record construction
    // ------------------------------------------------------------------

    /// Builds a fresh record seeded with every declared default value.
    #[must_use]
    pub fn default_record(&self) -> Record {
        let mut record = Record::new();
        for spec in self.nodes.values() {
            if let (Some(path), Some(default)) = (spec.value_path(), spec.default_value()) {
                record.set_value_at(path, default);
            }
        }
        record
    }

    // ------------------------------------------------------------------
    // Graph-wide projections
    // ------------------------------------------------------------------

    /// Projects a node's current data from the record.
    ///
    /// Fields and lists project their raw value (or declared default when the
    /// slot is absent); forms project an object mapping each non-ignored
    /// registered child's name to that child's projection.
    #[must_use]
    pub fn data_of(&self, id: &NodeId, record: &Record) -> Option<Value> {
        let mut visiting = BTreeSet::new();
        self.data_of_guarded(id, record, &mut visiting)
    }

    /// Recursive data projection with a cycle guard over form children.
    fn data_of_guarded(
        &self,
        id: &NodeId,
        record: &Record,
        visiting: &mut BTreeSet<NodeId>,
    ) -> Option<Value> {
        let spec = self.nodes.get(id)?;
        if !visiting.insert(id.clone()) {
            return None;
        }
        let data = match spec.kind() {
            NodeKind::Field(_) | NodeKind::List(_) => spec.value_path().map_or(Value::Null, |path| {
                record
                    .value_at(path)
                    .cloned()
                    .or_else(|| spec.default_value())
                    .unwrap_or(Value::Null)
            }),
            NodeKind::Form(form) => {
                let mut object = Map::new();
                for child in &form.children {
                    let Some(child_spec) = self.nodes.get(child) else {
                        continue;
                    };
                    if child_spec.is_ignored(record) {
                        continue;
                    }
                    if let Some(child_data) = self.data_of_guarded(child, record, visiting) {
                        object.insert(child_spec.name().to_string(), child_data);
                    }
                }
                Value::Object(object)
            }
        };
        visiting.remove(id);
        Some(data)
    }

    /// Returns a node's aggregate validity against the record.
    ///
    /// An ignored node is valid regardless of its stored error. A form is
    /// valid when its own error slot is empty and every non-ignored
    /// registered child is valid. Unregistered identifiers report valid.
    #[must_use]
    pub fn is_valid(&self, id: &NodeId, record: &Record) -> bool {
        let mut visiting = BTreeSet::new();
        self.is_valid_guarded(id, record, &mut visiting)
    }

    /// Recursive validity with a cycle guard over form children.
    fn is_valid_guarded(
        &self,
        id: &NodeId,
        record: &Record,
        visiting: &mut BTreeSet<NodeId>,
    ) -> bool {
        let Some(spec) = self.nodes.get(id) else {
            return true;
        };
        if spec.is_ignored(record) {
            return true;
        }
        if !visiting.insert(id.clone()) {
            return true;
        }
        let valid = match spec.kind() {
            NodeKind::Field(_) | NodeKind::List(_) => !record.has_error(id),
            NodeKind::Form(form) => {
                !record.has_error(id)
                    && form
                        .children
                        .iter()
                        .all(|child| self.is_valid_guarded(child, record, visiting))
            }
        };
        visiting.remove(id);
        valid
    }

    /// Returns a node's aggregate in-flight status against the record.
    ///
    /// A form is in flight when it, or any non-ignored registered child, has
    /// a pending validation or auxiliary fetch.
    #[must_use]
    pub fn in_flight(&self, id: &NodeId, record: &Record) -> bool {
        let mut visiting = BTreeSet::new();
        self.in_flight_guarded(id, record, &mut visiting)
    }

    /// Recursive in-flight aggregation with a cycle guard over form children.
    fn in_flight_guarded(
        &self,
        id: &NodeId,
        record: &Record,
        visiting: &mut BTreeSet<NodeId>,
    ) -> bool {
        let Some(spec) = self.nodes.get(id) else {
            return false;
        };
        if spec.is_ignored(record) {
            return false;
        }
        if !visiting.insert(id.clone()) {
            return false;
        }
        let pending = record.is_in_flight(id)
            || record.is_aux_in_flight(id)
            || spec
                .children()
                .iter()
                .any(|child| self.in_flight_guarded(child, record, visiting));
        visiting.remove(id);
        pending
    }
}
