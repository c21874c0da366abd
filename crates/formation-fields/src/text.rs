// crates/formation-fields/src/text.rs
// ============================================================================
// Module: Text Rules
// Description: Required and length-bounded string validation.
// Purpose: Cover the most common scalar field rules.
// Dependencies: formation-core, async-trait, serde_json
// ============================================================================

//! ## Overview
//! Text rules validate scalar string fields. A value that is not a string is
//! treated as missing rather than panicking on shape.

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
// SECTION: Required Text
// ============================================================================

/// Requires a non-empty string value after trimming.
#[derive(Debug, Clone)]
pub struct RequiredText {
    /// Message stored when the value is missing or blank.
    message: String,
}

impl RequiredText {
    /// Creates the rule with the default message.
    #[must_use]
    pub fn new() -> Self {
        Self {
            message: "this field is required".to_string(),
        }
    }

    /// Overrides the stored message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl Default for RequiredText {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Validator for RequiredText {
    async fn validate(
        &self,
        data: &Value,
        _record: &Record,
        _updated: Option<&NodeId>,
    ) -> Result<(), NodeError> {
        match data.as_str() {
            Some(text) if !text.trim().is_empty() => Ok(()),
            _ => Err(NodeError::field(self.message.clone())),
        }
    }
}

// ============================================================================
// SECTION: Length Bound
// ============================================================================

/// Bounds a string value's length in characters.
#[derive(Debug, Clone, Copy)]
pub struct MaxLength {
    /// Maximum number of characters accepted.
    limit: usize,
}

impl MaxLength {
    /// Creates the rule with the given character limit.
    #[must_use]
    pub const fn new(limit: usize) -> Self {
        Self { limit }
    }
}

#[async_trait]
impl Validator for MaxLength {
    async fn validate(
        &self,
        data: &Value,
        _record: &Record,
        _updated: Option<&NodeId>,
    ) -> Result<(), NodeError> {
        let length = data.as_str().map_or(0, |text| text.chars().count());
        if length > self.limit {
            return Err(NodeError::field(format!(
                "must be at most {} characters",
                self.limit
            )));
        }
        Ok(())
    }
}
