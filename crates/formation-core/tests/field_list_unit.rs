// crates/formation-core/tests/field_list_unit.rs
// ============================================================================
// Module: Field List Tests
// Description: Row operations, cell rules, and list-level validation.
// Purpose: Validate the per-row error shape and the row edit protocol.
// ============================================================================

//! Field-list tests covering row operations and the structured error shape.

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

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use formation_core::CellRule;
use formation_core::ColumnId;
use formation_core::ColumnSpec;
use formation_core::Engine;
use formation_core::EngineConfig;
use formation_core::InMemoryRecordStore;
use formation_core::ListErrors;
use formation_core::NodeError;
use formation_core::NodeId;
use formation_core::NodeSpec;
use formation_core::Record;
use formation_core::Registry;
use formation_core::Validator;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Test Fixtures
// ============================================================================

/// Cell rule requiring a non-empty string cell.
struct RequiredCell;

impl CellRule for RequiredCell {
    fn check(&self, value: &Value, _row: &Value, _record: &Record) -> Option<String> {
        match value.as_str() {
            Some(text) if !text.trim().is_empty() => None,
            _ => Some("cell is required".to_string()),
        }
    }
}

/// List validator marking rows whose `key` column collides.
struct UniqueKeys;

#[async_trait]
impl Validator for UniqueKeys {
    async fn validate(
        &self,
        data: &Value,
        _record: &Record,
        _updated: Option<&NodeId>,
    ) -> Result<(), NodeError> {
        let rows = data.as_array().cloned().unwrap_or_default();
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for row in &rows {
            if let Some(key) = row.get("key").and_then(Value::as_str) {
                *counts.entry(key.to_string()).or_insert(0) += 1;
            }
        }
        let mut errors = ListErrors::sized(rows.len());
        for (index, row) in rows.iter().enumerate() {
            let duplicated = row
                .get("key")
                .and_then(Value::as_str)
                .is_some_and(|key| counts.get(key).copied().unwrap_or(0) > 1);
            if duplicated && let Some(slot) = errors.rows.get_mut(index) {
                slot.insert(ColumnId::from("key"), "key must be unique");
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(NodeError::List(errors))
        }
    }
}

/// Declares a two-column list node named `tags`.
fn tags_list() -> NodeSpec {
    NodeSpec::list(
        "tags",
        [
            (ColumnId::from("key"), ColumnSpec::new(json!(""))),
            (ColumnId::from("value"), ColumnSpec::new(json!(""))),
        ],
    )
    .with_validator(UniqueKeys)
}

/// Builds an engine over the registry with a default-seeded store.
fn engine_for(registry: Registry) -> Engine<InMemoryRecordStore> {
    let registry = Arc::new(registry);
    let store = InMemoryRecordStore::with_record(registry.default_record());
    Engine::new(registry, store, EngineConfig::default())
}

/// Extracts the structured list errors stored for a node.
fn list_errors(engine: &Engine<InMemoryRecordStore>, id: &NodeId) -> ListErrors {
    match engine.record().error(id) {
        Some(NodeError::List(errors)) => errors.clone(),
        other => panic!("expected list errors, got {other:?}"),
    }
}

// ============================================================================
// SECTION: Uniqueness Across Rows
// ============================================================================

#[tokio::test]
async fn duplicate_keys_mark_both_rows_and_spare_the_rest() {
    let mut registry = Registry::new();
    registry.register(tags_list()).unwrap();
    let engine = engine_for(registry);
    let id = NodeId::from("tags");
    let key = ColumnId::from("key");

    engine.update_cell(&id, 0, &key, json!("env")).await.unwrap();
    engine.append_row(&id).await.unwrap();
    engine.update_cell(&id, 1, &key, json!("tier")).await.unwrap();
    engine.append_row(&id).await.unwrap();
    engine.update_cell(&id, 2, &key, json!("env")).await.unwrap();

    let errors = list_errors(&engine, &id);
    assert!(errors.row(0).is_some_and(|row| !row.is_empty()));
    assert!(errors.row(1).is_some_and(|row| row.is_empty()));
    assert!(errors.row(2).is_some_and(|row| !row.is_empty()));
    assert!(!engine.is_valid(&id).unwrap());

    engine.update_cell(&id, 2, &key, json!("owner")).await.unwrap();
    assert!(engine.is_valid(&id).unwrap());
}

// ============================================================================
// SECTION: Cell Rules
// ============================================================================

#[tokio::test]
async fn cell_rules_attach_errors_to_their_column() {
    let mut registry = Registry::new();
    registry
        .register(NodeSpec::list(
            "workers",
            [
                (
                    ColumnId::from("address"),
                    ColumnSpec::new(json!("")).with_rule(RequiredCell),
                ),
                (ColumnId::from("role"), ColumnSpec::new(json!("worker"))),
            ],
        ))
        .unwrap();
    let engine = engine_for(registry);
    let id = NodeId::from("workers");

    engine
        .update_cell(&id, 0, &ColumnId::from("role"), json!("master"))
        .await
        .unwrap();

    let errors = list_errors(&engine, &id);
    let first = errors.row(0).cloned().unwrap_or_default();
    assert_eq!(
        first.columns.get(&ColumnId::from("address")).map(String::as_str),
        Some("cell is required")
    );
    assert!(!first.columns.contains_key(&ColumnId::from("role")));
}

// ============================================================================
// SECTION: Row Operations
// ============================================================================

#[tokio::test]
async fn append_and_remove_follow_declared_bounds() {
    let mut registry = Registry::new();
    registry.register(tags_list()).unwrap();
    let registry = Arc::new(registry);
    let store = InMemoryRecordStore::with_record(registry.default_record());
    let engine = Engine::new(
        registry,
        store,
        EngineConfig {
            max_list_rows: 2,
            ..EngineConfig::default()
        },
    );
    let id = NodeId::from("tags");

    engine.append_row(&id).await.unwrap();
    let error = engine.append_row(&id).await.unwrap_err();
    assert_eq!(error.to_string(), "row limit reached: 2");

    engine.remove_row(&id, 1).await.unwrap();
    let error = engine.remove_row(&id, 5).await.unwrap_err();
    assert_eq!(error.to_string(), "row index out of bounds: 5 (rows: 1)");

    let error = engine
        .update_cell(&id, 3, &ColumnId::from("key"), json!("x"))
        .await
        .unwrap_err();
    assert_eq!(error.to_string(), "row index out of bounds: 3 (rows: 1)");
}

#[tokio::test]
async fn row_operations_require_a_list_node() {
    let mut registry = Registry::new();
    registry.register(NodeSpec::field("name", json!(""))).unwrap();
    let engine = engine_for(registry);
    let error = engine.append_row(&NodeId::from("name")).await.unwrap_err();
    assert_eq!(error.to_string(), "node is not a field list: name");
}
