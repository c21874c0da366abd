// crates/formation-trail/src/selection.rs
// ============================================================================
// Module: Trail Selection
// Description: Readiness- and commit-driven choice of the active trail.
// Purpose: Map externally observed session status onto choose/define/boot.
// Dependencies: crate::trail, serde, serde_json
// ============================================================================

//! ## Overview
//! Which trail is active is a small state machine driven by the status
//! boundary: an external poller supplies a readiness status and a commit
//! phase. A ready target or a succeeded commit enters the boot trail; a
//! commit in flight stays on the define trail; everything else — including
//! an unselected or unsupported platform — falls back to the choose trail.
//! Invariants:
//! - Variants are stable for serialization and contract matching.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::trail::Trail;

// ============================================================================
// SECTION: External Status
// ============================================================================

/// Readiness status supplied by the external poller.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReadinessStatus {
    /// Target is not ready yet.
    NotReady,
    /// Target is ready; the payload carries the reported status.
    Ready {
        /// Status payload reported by the poller.
        payload: Value,
    },
    /// Polling failed.
    Error {
        /// Failure description.
        message: String,
    },
}

/// Commit phase of the final record submission.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitPhase {
    /// No submission attempted.
    Idle,
    /// Submission requested, not yet acknowledged.
    Requested,
    /// Submission acknowledged, awaiting completion.
    Waiting,
    /// Submission committed.
    Succeeded,
    /// Submission failed.
    Failed,
}

/// Platform selection state of the session.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformSelection {
    /// No platform chosen yet.
    Unselected,
    /// Chosen platform is not supported by this build.
    Unsupported,
    /// Chosen platform is supported.
    Supported,
}

// ============================================================================
// SECTION: Trail Kinds
// ============================================================================

/// The three trails a session can be on.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailKind {
    /// Platform choice screens.
    Choose,
    /// Configuration definition screens.
    Define,
    /// Boot and completion screens.
    Boot,
}

impl TrailKind {
    /// Selects the active trail for the observed session status.
    #[must_use]
    pub const fn select(
        platform: PlatformSelection,
        status: &ReadinessStatus,
        commit: CommitPhase,
    ) -> Self {
        match platform {
            PlatformSelection::Unselected | PlatformSelection::Unsupported => Self::Choose,
            PlatformSelection::Supported => {
                if matches!(status, ReadinessStatus::Ready { .. })
                    || matches!(commit, CommitPhase::Succeeded)
                {
                    Self::Boot
                } else if matches!(commit, CommitPhase::Requested | CommitPhase::Waiting) {
                    Self::Define
                } else {
                    Self::Choose
                }
            }
        }
    }
}

// ============================================================================
// SECTION: Trail Set
// ============================================================================

/// The three trails of one wizard, resolved by kind.
#[derive(Clone)]
pub struct TrailSet {
    /// Platform choice trail.
    choose: Trail,
    /// Definition trail.
    define: Trail,
    /// Boot trail.
    boot: Trail,
}

impl TrailSet {
    /// Bundles the three trails.
    #[must_use]
    pub const fn new(choose: Trail, define: Trail, boot: Trail) -> Self {
        Self {
            choose,
            define,
            boot,
        }
    }

    /// Returns the trail for a kind.
    #[must_use]
    pub const fn active(&self, kind: TrailKind) -> &Trail {
        match kind {
            TrailKind::Choose => &self.choose,
            TrailKind::Define => &self.define,
            TrailKind::Boot => &self.boot,
        }
    }

    /// Resolves the active trail for the observed session status.
    #[must_use]
    pub const fn select(
        &self,
        platform: PlatformSelection,
        status: &ReadinessStatus,
        commit: CommitPhase,
    ) -> &Trail {
        self.active(TrailKind::select(platform, status, commit))
    }
}
