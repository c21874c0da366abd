// crates/formation-fields/src/number.rs
// ============================================================================
// Module: Numeric Rules
// Description: Integer range validation for number or numeric-string values.
// Purpose: Cover port, count, and size fields without domain knowledge.
// Dependencies: formation-core, async-trait, serde_json
// ============================================================================

//! ## Overview
//! Numeric rules accept JSON integers or integer strings, matching how
//! wizard screens round-trip numeric input as text.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use formation_core::NodeError;
use formation_core::NodeId;
use formation_core::Record;
use formation_core::Validator;
use serde_json::Value;

// ============================================================================
// SECTION: Integer Range
// ============================================================================

/// Requires a whole number within an inclusive range.
#[derive(Debug, Clone, Copy)]
pub struct IntRange {
    /// Inclusive lower bound.
    min: i64,
    /// Inclusive upper bound.
    max: i64,
}

impl IntRange {
    /// Creates the rule with inclusive bounds.
    #[must_use]
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Parses a JSON integer or integer string.
    fn parse(data: &Value) -> Option<i64> {
        match data {
            Value::Number(number) => number.as_i64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }
}

#[async_trait]
impl Validator for IntRange {
    async fn validate(
        &self,
        data: &Value,
        _record: &Record,
        _updated: Option<&NodeId>,
    ) -> Result<(), NodeError> {
        match Self::parse(data) {
            Some(value) if value >= self.min && value <= self.max => Ok(()),
            _ => Err(NodeError::field(format!(
                "must be a whole number between {} and {}",
                self.min, self.max
            ))),
        }
    }
}
