// crates/formation-core/src/tests.rs
// ============================================================================
// Module: Formation Core Unit Tests
// Description: Record model, declaration, and registry unit coverage.
// Purpose: Validate the pure data model without engine orchestration.
// ============================================================================

//! Unit tests for paths, error shapes, declarations, and the registry.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use serde_json::json;

use crate::core::identifiers::ColumnId;
use crate::core::identifiers::NodeId;
use crate::core::identifiers::Revision;
use crate::core::node::ColumnSpec;
use crate::core::node::NodeSpec;
use crate::core::record::ListErrors;
use crate::core::record::NodeError;
use crate::core::record::PathError;
use crate::core::record::Record;
use crate::core::record::RecordPath;
use crate::core::record::RowErrors;
use crate::core::registry::DeclarationError;
use crate::core::registry::Registry;
use crate::core::snapshot::RecordSnapshot;

// ============================================================================
// SECTION: Record Paths
// ============================================================================

#[test]
fn path_parses_dot_segments() {
    let path = RecordPath::parse("network.pods.cidr").unwrap();
    assert_eq!(path.segments(), ["network", "pods", "cidr"]);
    assert_eq!(path.to_string(), "network.pods.cidr");
}

#[test]
fn path_rejects_empty_input() {
    assert_eq!(RecordPath::parse(""), Err(PathError::Empty));
}

#[test]
fn path_rejects_empty_segment() {
    assert_eq!(
        RecordPath::parse("network..cidr"),
        Err(PathError::EmptySegment("network..cidr".to_string()))
    );
}

#[test]
fn value_write_creates_intermediate_objects() {
    let mut record = Record::new();
    let path = RecordPath::parse("network.pods.cidr").unwrap();
    record.set_value_at(&path, json!("10.2.0.0/16"));
    assert_eq!(record.value_at(&path), Some(&json!("10.2.0.0/16")));
    let parent = RecordPath::parse("network.pods").unwrap();
    assert_eq!(record.value_at(&parent), Some(&json!({"cidr": "10.2.0.0/16"})));
}

// ============================================================================
// SECTION: Error Shapes
// ============================================================================

#[test]
fn empty_field_error_counts_as_no_error() {
    let mut record = Record::new();
    let id = NodeId::from("name");
    record.set_error(&id, Some(NodeError::field("")));
    assert!(!record.has_error(&id));
    assert!(record.error(&id).is_none());
}

#[test]
fn list_errors_report_emptiness_per_slot() {
    let mut errors = ListErrors::sized(2);
    assert!(errors.is_empty());
    errors.rows[1].insert(ColumnId::from("key"), "duplicate");
    assert!(!errors.is_empty());
    assert!(errors.row(0).is_some_and(RowErrors::is_empty));
    assert!(errors.row(1).is_some_and(|row| !row.is_empty()));
}

#[test]
fn list_error_merge_keeps_existing_messages() {
    let mut base = ListErrors::sized(1);
    base.rows[0].insert(ColumnId::from("key"), "from cells");
    let mut incoming = ListErrors::sized(2);
    incoming.list = Some("list broken".to_string());
    incoming.rows[0].insert(ColumnId::from("key"), "from validator");
    incoming.rows[1].insert(ColumnId::from("name"), "missing");
    base.merge(incoming);
    assert_eq!(base.list.as_deref(), Some("list broken"));
    assert_eq!(base.rows[0].columns[&ColumnId::from("key")], "from cells");
    assert_eq!(base.rows[1].columns[&ColumnId::from("name")], "missing");
}

#[test]
fn revisions_advance_monotonically() {
    let zero = Revision::ZERO;
    assert!(zero < zero.next());
    assert_eq!(zero.next().get(), 1);
}

// ============================================================================
// SECTION: Registry Declarations
// ============================================================================

#[test]
fn duplicate_node_is_a_declaration_error() {
    let mut registry = Registry::new();
    registry.register(NodeSpec::field("name", json!(""))).unwrap();
    assert_eq!(
        registry.register(NodeSpec::field("name", json!(""))),
        Err(DeclarationError::DuplicateNode(NodeId::from("name")))
    );
}

#[test]
fn form_and_field_share_one_namespace() {
    let mut registry = Registry::new();
    registry.register(NodeSpec::field("cluster", json!(""))).unwrap();
    assert_eq!(
        registry.register(NodeSpec::form("cluster", [])),
        Err(DeclarationError::DuplicateNode(NodeId::from("cluster")))
    );
}

#[test]
fn colliding_record_paths_are_refused() {
    let mut registry = Registry::new();
    let path = RecordPath::parse("network.cidr").unwrap();
    registry
        .register(NodeSpec::field_at("pod_cidr", path.clone(), json!("")))
        .unwrap();
    assert_eq!(
        registry.register(NodeSpec::field_at("service_cidr", path, json!(""))),
        Err(DeclarationError::PathCollision {
            path: "network.cidr".to_string(),
            existing: NodeId::from("pod_cidr"),
        })
    );
}

#[test]
fn form_children_have_one_owner() {
    let mut registry = Registry::new();
    registry.register(NodeSpec::field("name", json!(""))).unwrap();
    registry
        .register(NodeSpec::form("general", [NodeId::from("name")]))
        .unwrap();
    assert_eq!(
        registry.register(NodeSpec::form("other", [NodeId::from("name")])),
        Err(DeclarationError::FormChildMultiplyOwned {
            child: NodeId::from("name"),
            owner: NodeId::from("general"),
        })
    );
    assert_eq!(registry.owner_of(&NodeId::from("name")), Some(&NodeId::from("general")));
}

#[test]
fn transitive_dependents_deduplicate() {
    let mut registry = Registry::new();
    registry.register(NodeSpec::field("a", json!(""))).unwrap();
    registry
        .register(NodeSpec::field("b", json!("")).with_dependency("a"))
        .unwrap();
    registry
        .register(NodeSpec::field("c", json!("")).with_dependency("a").with_dependency("b"))
        .unwrap();
    let closure = registry.transitive_dependents(&NodeId::from("a"));
    assert_eq!(closure, vec![NodeId::from("b"), NodeId::from("c")]);
}

#[test]
fn reset_clears_every_declaration() {
    let mut registry = Registry::new();
    registry.register(NodeSpec::field("name", json!(""))).unwrap();
    registry.reset();
    assert!(registry.is_empty());
    registry.register(NodeSpec::field("name", json!(""))).unwrap();
}

// ============================================================================
// SECTION: Defaults and Projection
// ============================================================================

#[test]
fn default_record_seeds_every_declared_default() {
    let mut registry = Registry::new();
    registry.register(NodeSpec::field("name", json!("cluster-1"))).unwrap();
    registry
        .register(NodeSpec::list(
            "workers",
            [(ColumnId::from("address"), ColumnSpec::new(json!("")))],
        ))
        .unwrap();
    let record = registry.default_record();
    let name = RecordPath::parse("name").unwrap();
    let workers = RecordPath::parse("workers").unwrap();
    assert_eq!(record.value_at(&name), Some(&json!("cluster-1")));
    assert_eq!(record.value_at(&workers), Some(&json!([{"address": ""}])));
}

#[test]
fn form_data_excludes_ignored_children() {
    let mut registry = Registry::new();
    registry.register(NodeSpec::field("platform", json!("aws"))).unwrap();
    registry
        .register(
            NodeSpec::field("region", json!("us-east-1")).with_ignore_when(|record: &Record| {
                let platform = RecordPath::parse("platform").ok();
                platform
                    .and_then(|path| record.value_at(&path).cloned())
                    .is_some_and(|value| value == json!("metal"))
            }),
        )
        .unwrap();
    registry
        .register(NodeSpec::form(
            "general",
            [NodeId::from("platform"), NodeId::from("region")],
        ))
        .unwrap();

    let record = registry.default_record();
    let data = registry.data_of(&NodeId::from("general"), &record).unwrap();
    assert_eq!(data, json!({"platform": "aws", "region": "us-east-1"}));

    let mut metal = registry.default_record();
    metal.set_value_at(&RecordPath::parse("platform").unwrap(), json!("metal"));
    let data = registry.data_of(&NodeId::from("general"), &metal).unwrap();
    assert_eq!(data, json!({"platform": "metal"}));
}

#[test]
fn ignored_nodes_are_valid_regardless_of_stored_error() {
    let mut registry = Registry::new();
    registry
        .register(NodeSpec::field("region", json!("")).with_ignore_when(|_| true))
        .unwrap();
    let id = NodeId::from("region");
    let mut record = registry.default_record();
    record.set_error(&id, Some(NodeError::field("unreachable region")));
    assert!(registry.is_valid(&id, &record));
}

// ============================================================================
// SECTION: Snapshots
// ============================================================================

#[test]
fn snapshot_strips_transient_slots() {
    let mut record = Record::new();
    let id = NodeId::from("name");
    record.set_value_at(&RecordPath::parse("name").unwrap(), json!("cluster-1"));
    record.mark_dirty(&id);
    record.set_error(&id, Some(NodeError::field("bad")));
    record.set_aux(&id, Some(json!(["a", "b"])));
    record.set_aux_error(&id, Some("boom".to_string()));
    record.set_in_flight(&id, true);

    let restored = RecordSnapshot::capture(&record).into_record();
    assert!(restored.is_dirty(&id));
    assert_eq!(
        restored.value_at(&RecordPath::parse("name").unwrap()),
        Some(&json!("cluster-1"))
    );
    assert!(restored.error(&id).is_none());
    assert!(restored.aux(&id).is_none());
    assert!(restored.aux_error(&id).is_none());
    assert!(!restored.is_in_flight(&id));
}
