//! Change-set computation: reduce an edited record to the fields that actually changed.

use crate::config::{FieldKind, FieldSchema};
use crate::entity::{display_value, ChangeSet, Entity, Record};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::sync::OnceLock;

/// How values are normalized before comparison.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coercion {
    /// Original numeric strings become numbers; everything else compares strictly.
    #[default]
    Loose,
    /// Each field compares according to its declared kind.
    Schema,
}

pub struct DiffEngine;

impl DiffEngine {
    /// Fields of `edited` whose normalized value differs from `original`.
    /// Fields missing from `edited` are never reported.
    pub fn compute(original: &Entity, edited: &Record) -> ChangeSet {
        let mut out = ChangeSet::new();
        for (field, value) in edited {
            let new = normalize_edited(value);
            if loosely_changed(&new, original.get(field)) {
                out.insert(field.clone(), new);
            }
        }
        out
    }

    /// Kind-aware comparison; fields not in `schema` use the loose rule.
    pub fn compute_typed(schema: &FieldSchema, original: &Entity, edited: &Record) -> ChangeSet {
        let mut out = ChangeSet::new();
        for (field, value) in edited {
            let new = normalize_edited(value);
            let old = original.get(field);
            let changed = match schema.field(field).map(|f| f.kind) {
                Some(FieldKind::Text) => {
                    display_value(&new) != old.and_then(display_value)
                }
                Some(FieldKind::Numeric | FieldKind::Reference) => {
                    !strict_eq(&numeric_or_self(&new), &normalize_original(old))
                }
                Some(FieldKind::Date) => match (as_date(&new), old.and_then(as_date)) {
                    (Some(a), Some(b)) => a != b,
                    _ => loosely_changed(&new, old),
                },
                None => loosely_changed(&new, old),
            };
            if changed {
                out.insert(field.clone(), new);
            }
        }
        out
    }

    pub fn compute_with(
        coercion: Coercion,
        schema: &FieldSchema,
        original: &Entity,
        edited: &Record,
    ) -> ChangeSet {
        match coercion {
            Coercion::Loose => Self::compute(original, edited),
            Coercion::Schema => Self::compute_typed(schema, original, edited),
        }
    }
}

/// Loose change-set between an entity and edited form values.
pub fn compute_change_set(original: &Entity, edited: &Record) -> ChangeSet {
    DiffEngine::compute(original, edited)
}

fn numeric_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("numeric pattern is valid")
    })
}

/// Parse a string that is entirely a decimal number (surrounding whitespace allowed).
pub(crate) fn parse_number(s: &str) -> Option<Value> {
    let t = s.trim();
    if !numeric_pattern().is_match(t) {
        return None;
    }
    if let Ok(i) = t.parse::<i64>() {
        return Some(Value::from(i));
    }
    t.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

/// An unchanged string (`"10.50"` vs `"10.50"`) and a coerced match
/// (`"42"` vs `42`) both count as equal.
fn loosely_changed(new: &Value, old: Option<&Value>) -> bool {
    let raw = match old {
        None => Value::Null,
        Some(Value::String(s)) if s.is_empty() => Value::Null,
        Some(v) => v.clone(),
    };
    !strict_eq(new, &raw) && !strict_eq(new, &normalize_original(old))
}

/// Empty string means "clear".
fn normalize_edited(v: &Value) -> Value {
    match v {
        Value::String(s) if s.is_empty() => Value::Null,
        other => other.clone(),
    }
}

fn normalize_original(v: Option<&Value>) -> Value {
    match v {
        None | Some(Value::Null) => Value::Null,
        Some(Value::String(s)) if s.is_empty() => Value::Null,
        Some(Value::String(s)) => parse_number(s).unwrap_or_else(|| Value::String(s.clone())),
        Some(other) => other.clone(),
    }
}

fn numeric_or_self(v: &Value) -> Value {
    match v {
        Value::String(s) => parse_number(s).unwrap_or_else(|| v.clone()),
        other => other.clone(),
    }
}

fn as_date(v: &Value) -> Option<NaiveDate> {
    let s = v.as_str()?.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|dt| dt.date())
}

/// Same type and same value; numbers compare numerically (`42 == 42.0`).
fn strict_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(i), Some(j)) => i == j,
            _ => x.as_f64() == y.as_f64(),
        },
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldDescriptor;
    use serde_json::json;

    fn entity(v: Value) -> Entity {
        Entity::from_value(v).unwrap()
    }

    fn record(v: Value) -> Record {
        match v {
            Value::Object(m) => Record::from(m),
            _ => panic!("record fixture must be an object"),
        }
    }

    #[test]
    fn single_changed_field_is_reported() {
        let original = entity(json!({"id": 1, "marca": "Acme", "saldo": 10}));
        let edited = record(json!({"marca": "Acme SA", "saldo": 10}));
        let diff = compute_change_set(&original, &edited);
        assert_eq!(diff.to_value(), json!({"marca": "Acme SA"}));
    }

    #[test]
    fn identical_record_yields_empty_diff() {
        let original = entity(json!({"id": 1, "marca": "Acme", "saldo": "10.50", "activo": true}));
        let diff = compute_change_set(&original, original.as_change_set_source());
        assert!(diff.is_empty());
    }

    #[test]
    fn empty_string_clears_to_null() {
        let original = entity(json!({"id": 1, "observacion": "pendiente"}));
        let diff = compute_change_set(&original, &record(json!({"observacion": ""})));
        assert_eq!(diff.get("observacion"), Some(&Value::Null));
    }

    #[test]
    fn numeric_string_original_matches_number() {
        let original = entity(json!({"id": 1, "monto": "42"}));
        let diff = compute_change_set(&original, &record(json!({"monto": 42})));
        assert!(diff.is_empty());
        let original = entity(json!({"id": 1, "monto": "42.50"}));
        let diff = compute_change_set(&original, &record(json!({"monto": 42.5})));
        assert!(diff.is_empty());
    }

    #[test]
    fn edited_string_is_not_coerced() {
        let original = entity(json!({"id": 1, "monto": 42}));
        let diff = compute_change_set(&original, &record(json!({"monto": "42"})));
        assert_eq!(diff.get("monto"), Some(&json!("42")));
    }

    #[test]
    fn both_empty_is_not_a_change() {
        let original = entity(json!({"id": 1, "a": null, "b": ""}));
        let diff = compute_change_set(&original, &record(json!({"a": "", "b": "", "c": ""})));
        assert!(diff.is_empty());
    }

    #[test]
    fn fields_missing_from_edited_are_ignored() {
        let original = entity(json!({"id": 1, "a": 1, "b": 2}));
        let diff = compute_change_set(&original, &record(json!({"a": 1})));
        assert!(diff.is_empty());
    }

    #[test]
    fn new_field_is_reported() {
        let original = entity(json!({"id": 1}));
        let diff = compute_change_set(&original, &record(json!({"caja": 3})));
        assert_eq!(diff.get("caja"), Some(&json!(3)));
    }

    #[test]
    fn reference_compares_key_not_label() {
        let original = entity(json!({"id": 1, "caja": 3, "caja_label": "Banco"}));
        let diff = compute_change_set(&original, &record(json!({"caja": 3})));
        assert!(diff.is_empty());
    }

    #[test]
    fn parse_number_requires_full_match() {
        assert_eq!(parse_number(" 7 "), Some(json!(7)));
        assert_eq!(parse_number("1e3"), Some(json!(1000.0)));
        assert_eq!(parse_number("12abc"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn typed_text_keeps_leading_zeros() {
        let schema = FieldSchema::new(vec![FieldDescriptor::text("codigo")]);
        let original = entity(json!({"id": 1, "codigo": "007"}));
        let edited = record(json!({"codigo": 7}));
        assert!(compute_change_set(&original, &edited).is_empty());
        let diff = DiffEngine::compute_typed(&schema, &original, &edited);
        assert_eq!(diff.get("codigo"), Some(&json!(7)));
    }

    #[test]
    fn typed_numeric_coerces_both_sides() {
        let schema = FieldSchema::new(vec![FieldDescriptor::numeric("monto")]);
        let original = entity(json!({"id": 1, "monto": 42}));
        let diff = DiffEngine::compute_typed(&schema, &original, &record(json!({"monto": "42"})));
        assert!(diff.is_empty());
    }

    #[test]
    fn typed_date_compares_calendar_day() {
        let schema = FieldSchema::new(vec![FieldDescriptor::date("fecha")]);
        let original = entity(json!({"id": 1, "fecha": "2024-01-05T00:00:00Z"}));
        let same = DiffEngine::compute_typed(&schema, &original, &record(json!({"fecha": "2024-01-05"})));
        assert!(same.is_empty());
        let moved = DiffEngine::compute_typed(&schema, &original, &record(json!({"fecha": "2024-01-06"})));
        assert_eq!(moved.get("fecha"), Some(&json!("2024-01-06")));
    }

    #[test]
    fn compute_with_dispatches_on_coercion() {
        let schema = FieldSchema::new(vec![FieldDescriptor::text("codigo")]);
        let original = entity(json!({"id": 1, "codigo": "007"}));
        let edited = record(json!({"codigo": 7}));
        assert!(DiffEngine::compute_with(Coercion::Loose, &schema, &original, &edited).is_empty());
        assert_eq!(
            DiffEngine::compute_with(Coercion::Schema, &schema, &original, &edited).len(),
            1
        );
    }
}
