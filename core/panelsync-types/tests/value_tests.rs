use panelsync_types::{Error, Value, ValueKind};
use std::str::FromStr;

// ── Value ───────────────────────────────────────────────────────

#[test]
fn value_kinds() {
    assert_eq!(Value::Bool(true).kind(), ValueKind::Bool);
    assert_eq!(Value::Number(2.5).kind(), ValueKind::Number);
}

#[test]
fn value_accessors() {
    assert_eq!(Value::Bool(true).as_bool(), Some(true));
    assert_eq!(Value::Bool(true).as_number(), None);
    assert_eq!(Value::Number(3.0).as_number(), Some(3.0));
    assert_eq!(Value::Number(3.0).as_bool(), None);
}

#[test]
fn value_from_primitives() {
    assert_eq!(Value::from(false), Value::Bool(false));
    assert_eq!(Value::from(5), Value::Number(5.0));
    assert_eq!(Value::from(0.5), Value::Number(0.5));
}

#[test]
fn value_json_is_bare() {
    assert_eq!(serde_json::to_string(&Value::Bool(true)).unwrap(), "true");
    let n: Value = serde_json::from_str("7").unwrap();
    assert_eq!(n, Value::Number(7.0));
    let b: Value = serde_json::from_str("false").unwrap();
    assert_eq!(b, Value::Bool(false));
}

#[test]
fn value_rejects_strings() {
    assert!(serde_json::from_str::<Value>("\"on\"").is_err());
}

#[test]
fn value_parse_from_text() {
    assert_eq!(Value::from_str("true").unwrap(), Value::Bool(true));
    assert_eq!(Value::from_str(" false ").unwrap(), Value::Bool(false));
    assert_eq!(Value::from_str("12.5").unwrap(), Value::Number(12.5));
    assert!(matches!(
        Value::from_str("fast"),
        Err(Error::InvalidValue(v)) if v == "fast"
    ));
}

#[test]
fn value_parse_refuses_non_finite() {
    for text in ["NaN", "nan", "inf", "-inf", "infinity"] {
        assert!(
            matches!(Value::from_str(text), Err(Error::InvalidValue(_))),
            "{text} should not parse"
        );
    }
    assert!(!Value::Number(f64::NAN).is_finite());
    assert!(Value::Number(1.5).is_finite());
    assert!(Value::Bool(false).is_finite());
}

#[test]
fn value_display() {
    assert_eq!(Value::Bool(true).to_string(), "true");
    assert_eq!(Value::Number(5.0).to_string(), "5");
}

#[test]
fn value_kind_display() {
    assert_eq!(ValueKind::Bool.to_string(), "boolean");
    assert_eq!(ValueKind::Number.to_string(), "numeric");
}
