use super::*;
use crate::expression::parser::parse_expr;

fn props(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn run(src: &str, scope: &dyn Scope) -> Result<f64, ExprError> {
    eval(&parse_expr(src).unwrap(), scope)
}

#[test]
fn arithmetic_over_properties() {
    let p = props(&[("rep", 2.0), ("spacing", 40.0)]);
    assert_eq!(run("rep * spacing + 10", &p).unwrap(), 90.0);
    assert_eq!(run("-(rep - 5) % 2", &p).unwrap(), 1.0);
}

#[test]
fn layered_scope_shadows_base() {
    let p = props(&[("t", 99.0), ("k", 3.0)]);
    let scope = Layered {
        base: &p,
        extra: &[("t", 1.5)],
    };
    assert_eq!(run("t * k", &scope).unwrap(), 4.5);
}

#[test]
fn logic_and_comparisons_yield_flags() {
    let p = props(&[("rep", 1.0)]);
    assert_eq!(run("rep == 1 && !(rep > 3)", &p).unwrap(), 1.0);
    assert_eq!(run("rep < 1 || false", &p).unwrap(), 0.0);
    assert_eq!(run("rep >= 1 ? 10 : 20", &p).unwrap(), 10.0);
}

#[test]
fn short_circuit_skips_unknown_identifiers() {
    let p = props(&[]);
    assert_eq!(run("0 && missing", &p).unwrap(), 0.0);
    assert_eq!(run("1 || missing", &p).unwrap(), 1.0);
}

#[test]
fn builtin_functions() {
    let p = props(&[]);
    assert_eq!(run("max(1, 5, 3)", &p).unwrap(), 5.0);
    assert_eq!(run("clamp(7, 0, 4)", &p).unwrap(), 4.0);
    assert_eq!(run("mix(10, 20, 0.25)", &p).unwrap(), 12.5);
    assert_eq!(run("pow(2, 10)", &p).unwrap(), 1024.0);
    assert_eq!(run("floor(2.7) + ceil(0.2)", &p).unwrap(), 3.0);
}

#[test]
fn unknown_identifier_and_function_are_errors() {
    let p = props(&[]);
    let e = run("1 + nope", &p).unwrap_err();
    assert!(e.message.contains("unknown identifier 'nope'"));
    assert_eq!(e.offset, 4);
    assert!(run("frob(1)", &p).unwrap_err().message.contains("unknown function"));
    assert!(run("sin(1, 2)", &p).unwrap_err().message.contains("expects 1"));
}
