// crates/formation-trail/tests/trail_navigation.rs
// ============================================================================
// Module: Trail Navigation Tests
// Description: Pairwise gating boundaries and path correction.
// Purpose: Validate that forward-navigability is a property of every
// intermediate page and that position healing is idempotent.
// ============================================================================

//! Navigation tests for pairwise gating and the self-healing path rule.

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

use std::sync::Arc;

use async_trait::async_trait;
use formation_core::Engine;
use formation_core::EngineConfig;
use formation_core::InMemoryRecordStore;
use formation_core::NodeError;
use formation_core::NodeId;
use formation_core::NodeSpec;
use formation_core::Record;
use formation_core::Registry;
use formation_core::Validator;
use formation_trail::FormGate;
use formation_trail::Page;
use formation_trail::PageGate;
use formation_trail::PagePath;
use formation_trail::Section;
use formation_trail::Trail;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Test Fixtures
// ============================================================================

/// Gate with a fixed answer.
struct Fixed(bool);

impl PageGate for Fixed {
    fn can_navigate_forward(&self, _record: &Record) -> bool {
        self.0
    }
}

/// Validator requiring a non-empty string value.
struct RequiredValue;

#[async_trait]
impl Validator for RequiredValue {
    async fn validate(
        &self,
        data: &Value,
        _record: &Record,
        _updated: Option<&NodeId>,
    ) -> Result<(), NodeError> {
        match data.as_str() {
            Some(text) if !text.trim().is_empty() => Ok(()),
            _ => Err(NodeError::field("value is required")),
        }
    }
}

/// Builds the three-page trail of the gating scenarios: P2 never passes.
fn blocked_middle() -> Trail {
    Trail::new([Section::new(
        "define",
        [
            Page::new("p1", "First"),
            Page::new("p2", "Second").with_gate(Fixed(false)),
            Page::new("p3", "Third"),
        ],
    )])
    .unwrap()
}

// ============================================================================
// SECTION: Pairwise Gating
// ============================================================================

#[test]
fn an_invalid_intermediate_page_blocks_the_jump() {
    let trail = blocked_middle();
    let record = Record::new();
    assert!(!trail.can_navigate(&PagePath::from("p1"), &PagePath::from("p3"), &record));
    assert!(!trail.can_navigate(&PagePath::from("p2"), &PagePath::from("p3"), &record));
}

#[test]
fn the_destination_gate_is_excluded_from_the_scanned_range() {
    let trail = blocked_middle();
    let record = Record::new();
    assert!(trail.can_navigate(&PagePath::from("p1"), &PagePath::from("p2"), &record));
}

#[test]
fn gating_is_symmetric_over_the_index_range() {
    let trail = blocked_middle();
    let record = Record::new();
    assert!(!trail.can_navigate(&PagePath::from("p3"), &PagePath::from("p1"), &record));
    assert!(trail.can_navigate(&PagePath::from("p2"), &PagePath::from("p1"), &record));
}

#[test]
fn pages_outside_the_trail_are_never_navigable() {
    let trail = blocked_middle();
    let record = Record::new();
    assert!(!trail.can_navigate(&PagePath::from("p1"), &PagePath::from("absent"), &record));
}

// ============================================================================
// SECTION: Path Correction
// ============================================================================

#[test]
fn fix_path_returns_the_first_failing_page_before_the_position() {
    let trail = blocked_middle();
    let record = Record::new();
    assert_eq!(
        trail.fix_path(&PagePath::from("p3"), &record),
        PagePath::from("p2")
    );
    assert_eq!(
        trail.fix_path(&PagePath::from("p1"), &record),
        PagePath::from("p1")
    );
}

#[test]
fn fix_path_resolves_unknown_paths_to_the_first_page() {
    let trail = blocked_middle();
    let record = Record::new();
    assert_eq!(
        trail.fix_path(&PagePath::from("absent"), &record),
        PagePath::from("p1")
    );
}

#[test]
fn fix_path_is_idempotent() {
    let trail = blocked_middle();
    let record = Record::new();
    let once = trail.fix_path(&PagePath::from("p3"), &record);
    let twice = trail.fix_path(&once, &record);
    assert_eq!(once, twice);
}

// ============================================================================
// SECTION: Form-Backed Gates
// ============================================================================

#[tokio::test]
async fn form_gates_follow_aggregate_validity() {
    let mut registry = Registry::new();
    registry
        .register(NodeSpec::field("cluster_name", json!("")).with_validator(RequiredValue))
        .unwrap();
    registry
        .register(NodeSpec::form("general", [NodeId::from("cluster_name")]))
        .unwrap();
    let registry = Arc::new(registry);
    let store = InMemoryRecordStore::with_record(registry.default_record());
    let engine = Engine::new(Arc::clone(&registry), store, EngineConfig::default());

    let trail = Trail::new([Section::new(
        "define",
        [
            Page::new("general", "General").with_gate(FormGate::new(Arc::clone(&registry), "general")),
            Page::new("network", "Network"),
        ],
    )])
    .unwrap();

    engine.validate_all().await.unwrap();
    let record = engine.record();
    assert!(!trail.can_navigate(&PagePath::from("general"), &PagePath::from("network"), &record));
    assert_eq!(
        trail.fix_path(&PagePath::from("network"), &record),
        PagePath::from("general")
    );

    engine
        .update_field(&NodeId::from("cluster_name"), json!("demo"))
        .await
        .unwrap();
    let record = engine.record();
    assert!(trail.can_navigate(&PagePath::from("general"), &PagePath::from("network"), &record));
    assert_eq!(
        trail.fix_path(&PagePath::from("network"), &record),
        PagePath::from("network")
    );
}
