// crates/formation-trail/src/page.rs
// ============================================================================
// Module: Trail Pages
// Description: Pages, navigation gates, and the form-backed gate adapter.
// Purpose: Tie screen positions to the validity of the forms that own them.
// Dependencies: formation-core, serde
// ============================================================================

//! ## Overview
//! A page is one screen position: a stable path, a title, and an optional
//! navigation gate. Gates answer one question — may the user move forward
//! past this page for the current record. A page without a gate is always
//! passable. [`FormGate`] adapts a registered form's aggregate validity so a
//! page is passable exactly when its owning form is valid.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use formation_core::NodeId;
use formation_core::Record;
use formation_core::Registry;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Page Paths
// ============================================================================

/// Stable path identifying one page.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by this type.
/// - Unique within one trail.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PagePath(String);

impl PagePath {
    /// Creates a new page path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Returns the path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for PagePath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PagePath {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Navigation Gates
// ============================================================================

/// Decides whether forward navigation may pass a page.
pub trait PageGate: Send + Sync {
    /// Returns true when the user may move forward past the page.
    fn can_navigate_forward(&self, record: &Record) -> bool;
}

/// Gate backed by a registered form's aggregate validity.
pub struct FormGate {
    /// Registry holding the form declaration.
    registry: Arc<Registry>,
    /// Form whose validity gates the page.
    form: NodeId,
}

impl FormGate {
    /// Creates a gate over the given form.
    #[must_use]
    pub fn new(registry: Arc<Registry>, form: impl Into<NodeId>) -> Self {
        Self {
            registry,
            form: form.into(),
        }
    }
}

impl PageGate for FormGate {
    fn can_navigate_forward(&self, record: &Record) -> bool {
        self.registry.is_valid(&self.form, record)
    }
}

// ============================================================================
// SECTION: Pages
// ============================================================================

/// One screen position in a trail.
#[derive(Clone)]
pub struct Page {
    /// Stable page path.
    path: PagePath,
    /// Display title.
    title: String,
    /// Optional navigation gate.
    gate: Option<Arc<dyn PageGate>>,
}

impl Page {
    /// Creates an ungated page.
    #[must_use]
    pub fn new(path: impl Into<PagePath>, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            gate: None,
        }
    }

    /// Attaches a navigation gate.
    #[must_use]
    pub fn with_gate(mut self, gate: impl PageGate + 'static) -> Self {
        self.gate = Some(Arc::new(gate));
        self
    }

    /// Returns the page path.
    #[must_use]
    pub const fn path(&self) -> &PagePath {
        &self.path
    }

    /// Returns the display title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Evaluates the gate; a page without a gate is always passable.
    #[must_use]
    pub fn can_navigate_forward(&self, record: &Record) -> bool {
        self.gate
            .as_ref()
            .is_none_or(|gate| gate.can_navigate_forward(record))
    }
}
