// crates/formation-fields/src/list.rs
// ============================================================================
// Module: List Rules
// Description: Uniqueness and non-emptiness validation for field lists.
// Purpose: Produce the structured per-row error shape for list nodes.
// Dependencies: formation-core, async-trait, serde_json
// ============================================================================

//! ## Overview
//! List rules return the structured [`ListErrors`] shape: a slot per row plus
//! a list-level slot. Uniqueness marks every row participating in a collision
//! so the screen can highlight all offenders, not just the later one.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use async_trait::async_trait;
use formation_core::ColumnId;
use formation_core::ListErrors;
use formation_core::NodeError;
use formation_core::NodeId;
use formation_core::Record;
use formation_core::Validator;
use serde_json::Value;

// ============================================================================
// SECTION: Column Uniqueness
// ============================================================================

/// Requires one column's values to be unique across rows.
#[derive(Debug, Clone)]
pub struct UniqueColumn {
    /// Column whose values must be unique.
    column: ColumnId,
    /// Message stored on every colliding row.
    message: String,
}

impl UniqueColumn {
    /// Creates the rule for the given column with the default message.
    #[must_use]
    pub fn new(column: impl Into<ColumnId>) -> Self {
        Self {
            column: column.into(),
            message: "must be unique".to_string(),
        }
    }

    /// Overrides the stored message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Reads the keyed cell of a row as a comparable string.
    fn cell_key(&self, row: &Value) -> Option<String> {
        let cell = row.as_object()?.get(self.column.as_str())?;
        match cell {
            Value::String(text) if !text.is_empty() => Some(text.clone()),
            Value::String(_) | Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

#[async_trait]
impl Validator for UniqueColumn {
    async fn validate(
        &self,
        data: &Value,
        _record: &Record,
        _updated: Option<&NodeId>,
    ) -> Result<(), NodeError> {
        let rows = data.as_array().cloned().unwrap_or_default();
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for row in &rows {
            if let Some(key) = self.cell_key(row) {
                *counts.entry(key).or_insert(0) += 1;
            }
        }
        let mut errors = ListErrors::sized(rows.len());
        for (index, row) in rows.iter().enumerate() {
            let duplicated = self
                .cell_key(row)
                .is_some_and(|key| counts.get(&key).copied().unwrap_or(0) > 1);
            if duplicated && let Some(slot) = errors.rows.get_mut(index) {
                slot.insert(self.column.clone(), self.message.clone());
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(NodeError::List(errors))
        }
    }
}

// ============================================================================
// SECTION: Non-Empty List
// ============================================================================

/// Requires the list to hold at least one row.
#[derive(Debug, Clone)]
pub struct NonEmptyList {
    /// Message stored in the list-level slot.
    message: String,
}

impl NonEmptyList {
    /// Creates the rule with the default message.
    #[must_use]
    pub fn new() -> Self {
        Self {
            message: "at least one row is required".to_string(),
        }
    }

    /// Overrides the stored message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl Default for NonEmptyList {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Validator for NonEmptyList {
    async fn validate(
        &self,
        data: &Value,
        _record: &Record,
        _updated: Option<&NodeId>,
    ) -> Result<(), NodeError> {
        let empty = data.as_array().is_none_or(Vec::is_empty);
        if empty {
            return Err(NodeError::list_level(self.message.clone()));
        }
        Ok(())
    }
}
