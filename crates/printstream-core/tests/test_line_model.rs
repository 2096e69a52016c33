use printstream_core::{classify, param_value, parse_move, LineKind, MoveSnapshot};
use proptest::prelude::*;

proptest! {
    #[test]
    fn param_value_roundtrips_formatted_floats(v in -10_000.0f64..10_000.0) {
        let line = format!("G1 X{} F3000", v);
        let parsed = param_value(&line, 'X').expect("formatted value must parse");
        prop_assert!((parsed - v).abs() < 1e-9);
    }

    #[test]
    fn param_value_never_panics(line in "\\PC*", letter in proptest::char::range('A', 'Z')) {
        let _ = param_value(&line, letter);
    }

    #[test]
    fn classify_never_panics(line in "\\PC*") {
        let _ = classify(&line);
    }
}

#[test]
fn test_successive_partial_moves_accumulate() {
    // Each update preserves previously known axes.
    let mut tracked = MoveSnapshot::unknown();
    for line in ["G1 X10", "G1 Y20", "G1 Z5"] {
        assert_eq!(classify(line), LineKind::Move);
        tracked = tracked.merged_with(&parse_move(line));
    }
    assert_eq!(tracked.x, Some(10.0));
    assert_eq!(tracked.y, Some(20.0));
    assert_eq!(tracked.z, Some(5.0));
}
