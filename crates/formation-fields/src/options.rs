// crates/formation-fields/src/options.rs
// ============================================================================
// Module: Option Fetchers
// Description: Fixed-payload and always-failing auxiliary fetchers.
// Purpose: Cover static option lists and wiring tests without a transport.
// Dependencies: formation-core, async-trait, serde_json
// ============================================================================

//! ## Overview
//! Option fetchers implement the auxiliary-data boundary for the two cases
//! that need no transport: option sets known at declaration time, and
//! deliberate failures used to exercise degradation paths.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use formation_core::AuxFetcher;
use formation_core::FetchError;
use formation_core::Record;
use serde_json::Value;

// ============================================================================
// SECTION: Static Options
// ============================================================================

/// Fetcher returning a fixed payload on every call.
#[derive(Debug, Clone)]
pub struct StaticOptions {
    /// Payload returned on every fetch.
    payload: Value,
}

impl StaticOptions {
    /// Creates the fetcher around the given payload.
    #[must_use]
    pub const fn new(payload: Value) -> Self {
        Self { payload }
    }
}

#[async_trait]
impl AuxFetcher for StaticOptions {
    async fn fetch(&self, _record: &Record) -> Result<Value, FetchError> {
        Ok(self.payload.clone())
    }
}

// ============================================================================
// SECTION: Failing Options
// ============================================================================

/// Fetcher that fails with a fixed message on every call.
#[derive(Debug, Clone)]
pub struct FailingOptions {
    /// Failure message reported on every fetch.
    message: String,
}

impl FailingOptions {
    /// Creates the fetcher with the given failure message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl AuxFetcher for FailingOptions {
    async fn fetch(&self, _record: &Record) -> Result<Value, FetchError> {
        Err(FetchError::Failed(self.message.clone()))
    }
}
