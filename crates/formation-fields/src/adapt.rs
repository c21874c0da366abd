// crates/formation-fields/src/adapt.rs
// ============================================================================
// Module: Closure Adapters
// Description: Adapters turning plain closures into boundary trait objects.
// Purpose: Keep one-off rules declarable inline at form-declaration sites.
// Dependencies: formation-core, async-trait, serde_json
// ============================================================================

//! ## Overview
//! Most domain rules are one-off closures written next to the field they
//! guard. These adapters lift synchronous closures into the asynchronous
//! [`Validator`] interface and the [`CellRule`] interface without requiring
//! a named type per rule.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use formation_core::CellRule;
use formation_core::NodeError;
use formation_core::NodeId;
use formation_core::Record;
use formation_core::Validator;
use serde_json::Value;

// ============================================================================
// SECTION: Validator Adapter
// ============================================================================

/// Wraps a synchronous closure as a [`Validator`].
pub struct FnValidator<F> {
    /// Wrapped rule.
    rule: F,
}

impl<F> FnValidator<F>
where
    F: Fn(&Value, &Record, Option<&NodeId>) -> Result<(), NodeError> + Send + Sync,
{
    /// Creates the adapter around the given closure.
    #[must_use]
    pub const fn new(rule: F) -> Self {
        Self { rule }
    }
}

#[async_trait]
impl<F> Validator for FnValidator<F>
where
    F: Fn(&Value, &Record, Option<&NodeId>) -> Result<(), NodeError> + Send + Sync,
{
    async fn validate(
        &self,
        data: &Value,
        record: &Record,
        updated: Option<&NodeId>,
    ) -> Result<(), NodeError> {
        (self.rule)(data, record, updated)
    }
}

// ============================================================================
// SECTION: Cell Rule Adapter
// ============================================================================

/// Wraps a closure as a [`CellRule`].
pub struct CellFn<F> {
    /// Wrapped rule.
    rule: F,
}

impl<F> CellFn<F>
where
    F: Fn(&Value, &Value, &Record) -> Option<String> + Send + Sync,
{
    /// Creates the adapter around the given closure.
    #[must_use]
    pub const fn new(rule: F) -> Self {
        Self { rule }
    }
}

impl<F> CellRule for CellFn<F>
where
    F: Fn(&Value, &Value, &Record) -> Option<String> + Send + Sync,
{
    fn check(&self, value: &Value, row: &Value, record: &Record) -> Option<String> {
        (self.rule)(value, row, record)
    }
}
