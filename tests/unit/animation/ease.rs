use super::*;

const ALL_FAMILIES: [&str; 10] = [
    "back", "bounce", "circ", "cubic", "elastic", "expo", "quad", "quart", "quint", "sine",
];

#[test]
fn every_named_curve_hits_endpoints() {
    for fam in ALL_FAMILIES {
        for dir in ["in", "out", "in-out"] {
            let name = format!("{fam}-{dir}");
            let e = Ease::from_name(&name).unwrap();
            assert!(e.apply(0.0).abs() < 1e-9, "{name} at 0");
            assert!((e.apply(1.0) - 1.0).abs() < 1e-9, "{name} at 1");
            assert_eq!(e.name(), name);
        }
    }
}

#[test]
fn in_out_is_half_at_midpoint() {
    for fam in ALL_FAMILIES {
        let e = Ease::from_name(&format!("{fam}-in-out")).unwrap();
        assert!((e.apply(0.5) - 0.5).abs() < 1e-9, "{fam}");
    }
}

#[test]
fn simple_curves_match_closed_forms() {
    let quad_in = Ease::from_name("quad-in").unwrap();
    let cubic_out = Ease::from_name("cubic-out").unwrap();
    assert!((quad_in.apply(0.5) - 0.25).abs() < 1e-12);
    assert!((cubic_out.apply(0.5) - 0.875).abs() < 1e-12);
    assert_eq!(Ease::Linear.apply(0.3), 0.3);
}

#[test]
fn zero_and_one_are_constant() {
    assert_eq!(Ease::from_name("zero").unwrap().apply(0.7), 0.0);
    assert_eq!(Ease::from_name("one").unwrap().apply(0.1), 1.0);
}

#[test]
fn apply_clamps_progress() {
    assert_eq!(Ease::Linear.apply(-1.0), 0.0);
    assert_eq!(Ease::Linear.apply(2.0), 1.0);
}

#[test]
fn back_in_undershoots() {
    assert!(Ease::from_name("back-in").unwrap().apply(0.2) < 0.0);
}

#[test]
fn unknown_names_are_rejected() {
    for bad in ["", "quad", "cubic-sideways", "wobble-in", "Linear"] {
        assert!(Ease::from_name(bad).is_err(), "{bad}");
    }
}
