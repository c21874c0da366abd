// crates/formation-core/tests/proptest_record.rs
// ============================================================================
// Module: Record Property-Based Tests
// Description: Property tests for path parsing and value addressing.
// Purpose: Detect invariant violations across wide path and value ranges.
// ============================================================================

//! Property-based tests for record path and value-tree invariants.

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
use formation_core::RecordPath;
use proptest::prelude::*;
use serde_json::json;

/// Strategy for valid dot-free path segments.
fn segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}"
}

proptest! {
    #[test]
    fn parse_and_display_round_trip(segments in prop::collection::vec(segment(), 1 .. 5)) {
        let rendered = segments.join(".");
        let path = RecordPath::parse(&rendered).unwrap();
        prop_assert_eq!(path.segments(), segments.as_slice());
        prop_assert_eq!(path.to_string(), rendered);
    }

    #[test]
    fn written_values_read_back_at_the_same_path(
        segments in prop::collection::vec(segment(), 1 .. 5),
        value in any::<i64>(),
    ) {
        let rendered = segments.join(".");
        let path = RecordPath::parse(&rendered).unwrap();
        let mut record = Record::new();
        record.set_value_at(&path, json!(value));
        prop_assert_eq!(record.value_at(&path), Some(&json!(value)));
    }

    #[test]
    fn sibling_writes_do_not_disturb_each_other(
        base in segment(),
        first in segment(),
        second in segment(),
        value in any::<i64>(),
    ) {
        prop_assume!(first != second);
        let first_path = RecordPath::parse(&format!("{base}.{first}")).unwrap();
        let second_path = RecordPath::parse(&format!("{base}.{second}")).unwrap();
        let mut record = Record::new();
        record.set_value_at(&first_path, json!(value));
        record.set_value_at(&second_path, json!("other"));
        prop_assert_eq!(record.value_at(&first_path), Some(&json!(value)));
        prop_assert_eq!(record.value_at(&second_path), Some(&json!("other")));
    }

    #[test]
    fn paths_with_empty_segments_never_parse(base in segment()) {
        let doubled = format!("{base}..{base}");
        prop_assert!(RecordPath::parse(&doubled).is_err());
        let trailing = format!("{base}.");
        prop_assert!(RecordPath::parse(&trailing).is_err());
    }
}
