// crates/formation-core/examples/minimal.rs
// ============================================================================
// Module: Formation Minimal Example
// Description: Minimal end-to-end wizard session using in-memory adapters.
// Purpose: Demonstrate declaration, editing, propagation, and snapshots.
// Dependencies: formation-core
// ============================================================================

//! ## Overview
//! Declares a tiny configuration graph, runs the initial full-graph pass,
//! applies a user edit, and captures a persistable snapshot. The example is
//! backend-agnostic and suitable for quick verification.

use std::sync::Arc;

use async_trait::async_trait;
use formation_core::AuxFetcher;
use formation_core::Engine;
use formation_core::EngineConfig;
use formation_core::FetchError;
use formation_core::InMemoryRecordStore;
use formation_core::NodeError;
use formation_core::NodeId;
use formation_core::NodeSpec;
use formation_core::Record;
use formation_core::RecordSnapshot;
use formation_core::Registry;
use formation_core::Validator;
use serde_json::Value;
use serde_json::json;

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

/// Fetcher returning a fixed region list once its dependencies are valid.
struct ExampleRegions;

#[async_trait]
impl AuxFetcher for ExampleRegions {
    async fn fetch(&self, _record: &Record) -> Result<Value, FetchError> {
        Ok(json!(["us-east-1", "eu-west-1"]))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut registry = Registry::new();
    registry.register(NodeSpec::field("cluster_name", json!("")).with_validator(RequiredValue))?;
    registry.register(
        NodeSpec::field("region", json!(""))
            .with_dependency("cluster_name")
            .with_aux_fetcher(ExampleRegions)
            .with_validator(RequiredValue),
    )?;
    registry.register(NodeSpec::form(
        "general",
        [NodeId::from("cluster_name"), NodeId::from("region")],
    ))?;

    let registry = Arc::new(registry);
    let store = InMemoryRecordStore::with_record(registry.default_record());
    let engine = Engine::new(Arc::clone(&registry), store, EngineConfig::default());

    engine.validate_all().await?;

    engine
        .update_field(&NodeId::from("cluster_name"), json!("demo"))
        .await?;
    engine
        .update_field(&NodeId::from("region"), json!("us-east-1"))
        .await?;

    let record = engine.record();
    let form_valid = engine.is_valid(&NodeId::from("general"))?;
    let regions = record.aux(&NodeId::from("region")).cloned();
    let snapshot = RecordSnapshot::capture(&record);
    let _ = (form_valid, regions, snapshot);
    Ok(())
}
