// crates/formation-core/src/runtime/schedule.rs
// ============================================================================
// Module: Formation Graph Scheduling
// Description: Topological evaluation order with deferral for full-graph passes.
// Purpose: Visit every node after its dependencies, or fail with a diagnosis.
// Dependencies: crate::core::{identifiers, registry}, thiserror
// ============================================================================

//! ## Overview
//! Full-graph validation visits every registered node exactly once, each node
//! strictly after all of its registered dependencies. The scheduler computes
//! that order up front. Two failure modes are diagnosed separately: a declared
//! dependency whose identifier was never registered, and a true cycle among
//! registered nodes. Both are fatal; the engine never silently drops a node.
//! Invariants:
//! - The returned order contains every registered node exactly once.
//! - Within one deferral round, nodes are emitted in identifier order, which
//!   keeps full-graph passes deterministic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use thiserror::Error;

use crate::core::identifiers::NodeId;
use crate::core::registry::Registry;

// ============================================================================
// SECTION: Schedule Errors
// ============================================================================

/// Fatal errors raised while scheduling a full-graph pass.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// A declared dependency identifier was never registered.
    #[error("dependency not registered: {node} depends on {dependency}")]
    UnknownDependency {
        /// Node declaring the dependency.
        node: NodeId,
        /// Identifier that was never registered.
        dependency: NodeId,
    },
    /// The registered nodes contain a dependency cycle.
    #[error("unresolvable dependency cycle among: {}", join_ids(.members))]
    DependencyCycle {
        /// Nodes that could not be scheduled.
        members: Vec<NodeId>,
    },
}

/// Joins node identifiers for cycle diagnostics.
fn join_ids(members: &[NodeId]) -> String {
    members
        .iter()
        .map(NodeId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// SECTION: Evaluation Order
// ============================================================================

/// Computes a dependency-respecting evaluation order over the whole registry.
///
/// # Errors
///
/// Returns [`ScheduleError::UnknownDependency`] when any declared dependency
/// id was never registered, and [`ScheduleError::DependencyCycle`] when the
/// remaining nodes cannot make progress.
pub fn evaluation_order(registry: &Registry) -> Result<Vec<NodeId>, ScheduleError> {
    for id in registry.node_ids() {
        for dependency in registry.effective_dependencies(id) {
            if !registry.contains(&dependency) {
                return Err(ScheduleError::UnknownDependency {
                    node: id.clone(),
                    dependency,
                });
            }
        }
    }

    let mut unvisited: BTreeSet<NodeId> = registry.node_ids().cloned().collect();
    let mut visited: BTreeSet<NodeId> = BTreeSet::new();
    let mut order: Vec<NodeId> = Vec::with_capacity(unvisited.len());

    while !unvisited.is_empty() {
        let ready: Vec<NodeId> = unvisited
            .iter()
            .filter(|id| {
                registry
                    .effective_dependencies(id)
                    .iter()
                    .all(|dependency| visited.contains(dependency))
            })
            .cloned()
            .collect();
        if ready.is_empty() {
            return Err(ScheduleError::DependencyCycle {
                members: unvisited.into_iter().collect(),
            });
        }
        for id in ready {
            unvisited.remove(&id);
            visited.insert(id.clone());
            order.push(id);
        }
    }

    Ok(order)
}
