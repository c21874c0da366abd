// crates/formation-trail/tests/proptest_trail.rs
// ============================================================================
// Module: Trail Property-Based Tests
// Description: Property tests for path correction and pairwise gating.
// Purpose: Detect invariant violations across arbitrary gate layouts.
// ============================================================================

//! Property-based tests for trail invariants.

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

use formation_core::Record;
use formation_trail::Page;
use formation_trail::PageGate;
use formation_trail::PagePath;
use formation_trail::Section;
use formation_trail::Trail;
use proptest::prelude::*;

/// Gate with a fixed answer.
struct Fixed(bool);

impl PageGate for Fixed {
    fn can_navigate_forward(&self, _record: &Record) -> bool {
        self.0
    }
}

/// Builds a trail with one page per gate flag.
fn trail_from_gates(gates: &[bool]) -> Trail {
    let pages = gates.iter().enumerate().map(|(index, passable)| {
        Page::new(format!("page-{index}"), format!("Page {index}")).with_gate(Fixed(*passable))
    });
    Trail::new([Section::new("generated", pages)]).unwrap()
}

proptest! {
    #[test]
    fn fix_path_is_idempotent_for_any_gate_layout(
        gates in prop::collection::vec(any::<bool>(), 1 .. 12),
        start in 0_usize .. 12,
    ) {
        let trail = trail_from_gates(&gates);
        let record = Record::new();
        let start_path = PagePath::from(format!("page-{}", start % gates.len()));
        let once = trail.fix_path(&start_path, &record);
        let twice = trail.fix_path(&once, &record);
        prop_assert_eq!(&once, &twice);
    }

    #[test]
    fn fix_path_never_moves_the_position_forward(
        gates in prop::collection::vec(any::<bool>(), 1 .. 12),
        start in 0_usize .. 12,
    ) {
        let trail = trail_from_gates(&gates);
        let record = Record::new();
        let start_index = start % gates.len();
        let start_path = PagePath::from(format!("page-{start_index}"));
        let fixed = trail.fix_path(&start_path, &record);
        let fixed_index = trail.index_of(&fixed).unwrap_or(usize::MAX);
        prop_assert!(fixed_index <= start_index);
    }

    #[test]
    fn navigation_past_a_closed_gate_is_always_refused(
        gates in prop::collection::vec(any::<bool>(), 2 .. 12),
    ) {
        let trail = trail_from_gates(&gates);
        let record = Record::new();
        let first = PagePath::from("page-0");
        let last = PagePath::from(format!("page-{}", gates.len() - 1));
        let blocked = gates[.. gates.len() - 1].iter().any(|passable| !passable);
        prop_assert_eq!(trail.can_navigate(&first, &last, &record), !blocked);
    }
}
