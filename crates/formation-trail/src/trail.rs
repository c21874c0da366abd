// crates/formation-trail/src/trail.rs
// ============================================================================
// Module: Trail State Machine
// Description: Ordered page sections, pairwise gating, and path correction.
// Purpose: Decide reachability, forward-navigability, and position healing.
// Dependencies: crate::page, formation-core, thiserror
// ============================================================================

//! ## Overview
//! A trail is an immutable, ordered view over one or more page sections,
//! optionally filtered by a whitelist. Forward navigation between two pages
//! is a property of every intermediate page: each gate on indices in
//! `[min, max)` must pass. The half-open range excludes the page being
//! navigated *to* — the destination's own gate never gates entry into it.
//! Invariants:
//! - Page paths are unique within one trail.
//! - `fix_path` is idempotent for any fixed record.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use formation_core::Record;
use thiserror::Error;

use crate::page::Page;
use crate::page::PagePath;

// ============================================================================
// SECTION: Trail Errors
// ============================================================================

/// Fatal errors raised while building a trail.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrailError {
    /// The same page path appeared twice.
    #[error("duplicate page in trail: {0}")]
    DuplicatePage(PagePath),
}

// ============================================================================
// SECTION: Sections
// ============================================================================

/// Named ordered group of pages.
#[derive(Clone)]
pub struct Section {
    /// Section name used for grouping.
    name: String,
    /// Pages in section order.
    pages: Vec<Page>,
}

impl Section {
    /// Creates a section from ordered pages.
    #[must_use]
    pub fn new(name: impl Into<String>, pages: impl IntoIterator<Item = Page>) -> Self {
        Self {
            name: name.into(),
            pages: pages.into_iter().collect(),
        }
    }

    /// Returns the section name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// SECTION: Trail
// ============================================================================

/// Immutable ordered view over navigable pages.
#[derive(Clone)]
pub struct Trail {
    /// Flattened, filtered pages in trail order.
    pages: Vec<Page>,
}

impl Trail {
    /// Builds a trail from ordered sections.
    ///
    /// # Errors
    ///
    /// Returns [`TrailError::DuplicatePage`] when a page path repeats.
    pub fn new(sections: impl IntoIterator<Item = Section>) -> Result<Self, TrailError> {
        Self::build(sections, None)
    }

    /// Builds a trail keeping only whitelisted pages, order preserved.
    ///
    /// # Errors
    ///
    /// Returns [`TrailError::DuplicatePage`] when a page path repeats.
    pub fn with_whitelist(
        sections: impl IntoIterator<Item = Section>,
        whitelist: &[PagePath],
    ) -> Result<Self, TrailError> {
        Self::build(sections, Some(whitelist))
    }

    /// Shared construction: flatten, filter, and check uniqueness.
    fn build(
        sections: impl IntoIterator<Item = Section>,
        whitelist: Option<&[PagePath]>,
    ) -> Result<Self, TrailError> {
        let mut seen: BTreeSet<PagePath> = BTreeSet::new();
        let mut pages = Vec::new();
        for section in sections {
            for page in section.pages {
                if let Some(allowed) = whitelist
                    && !allowed.contains(page.path())
                {
                    continue;
                }
                if !seen.insert(page.path().clone()) {
                    return Err(TrailError::DuplicatePage(page.path().clone()));
                }
                pages.push(page);
            }
        }
        Ok(Self { pages })
    }

    /// Returns the pages in trail order.
    #[must_use]
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Returns true when the page is included in this trail.
    #[must_use]
    pub fn contains(&self, path: &PagePath) -> bool {
        self.index_of(path).is_some()
    }

    /// Returns the index of a page within the trail.
    #[must_use]
    pub fn index_of(&self, path: &PagePath) -> Option<usize> {
        self.pages.iter().position(|page| page.path() == path)
    }

    /// Returns the first page of the trail.
    #[must_use]
    pub fn first(&self) -> Option<&Page> {
        self.pages.first()
    }

    /// Decides whether navigation between two pages is allowed.
    ///
    /// Every gate on indices in `[min(a, b), max(a, b))` must pass; the
    /// destination page's own gate is excluded. Pages outside the trail are
    /// never navigable.
    #[must_use]
    pub fn can_navigate(&self, from: &PagePath, to: &PagePath, record: &Record) -> bool {
        let (Some(from_index), Some(to_index)) = (self.index_of(from), self.index_of(to)) else {
            return false;
        };
        let start = from_index.min(to_index);
        let end = from_index.max(to_index);
        self.pages[start..end]
            .iter()
            .all(|page| page.can_navigate_forward(record))
    }

    /// Snaps an out-of-policy position back to the nearest valid page.
    ///
    /// The path is resolved to a page (unknown paths resolve to the first
    /// page); the result is the first page from the trail start up to and
    /// including the resolved page whose own gate fails, or the resolved
    /// path when every gate passes. An empty trail returns the input.
    #[must_use]
    pub fn fix_path(&self, path: &PagePath, record: &Record) -> PagePath {
        let resolved = self.index_of(path).unwrap_or(0);
        let Some(target) = self.pages.get(resolved) else {
            return path.clone();
        };
        self.pages[..=resolved]
            .iter()
            .find(|page| !page.can_navigate_forward(record))
            .map_or_else(|| target.path().clone(), |page| page.path().clone())
    }

    /// Returns the page after the given one, if any.
    #[must_use]
    pub fn next_from(&self, path: &PagePath) -> Option<&Page> {
        let index = self.index_of(path)?;
        self.pages.get(index + 1)
    }

    /// Returns the page before the given one, if any.
    #[must_use]
    pub fn previous_from(&self, path: &PagePath) -> Option<&Page> {
        let index = self.index_of(path)?;
        index.checked_sub(1).and_then(|previous| self.pages.get(previous))
    }
}
