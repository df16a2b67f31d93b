//! Entities, form records and change-sets: JSON-shaped field maps.

use crate::error::CrudError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type EntityId = i64;

/// Field name -> scalar value, without identity. Used for form values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    pub fn with(mut self, field: impl Into<String>, value: Value) -> Self {
        self.insert(field, value);
        self
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Value);
    type IntoIter = serde_json::map::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A server-side row: stable numeric id plus its fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    #[serde(flatten)]
    fields: Record,
}

impl Entity {
    pub fn new(id: EntityId, mut fields: Record) -> Self {
        fields.remove("id");
        Self { id, fields }
    }

    /// Build from a response body. The id may arrive as a number or a numeric string.
    pub fn from_value(value: Value) -> Result<Self, CrudError> {
        let Value::Object(mut map) = value else {
            return Err(CrudError::transport("response body is not an object"));
        };
        let id = match map.remove("id") {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
        .ok_or_else(|| CrudError::transport("response body has no numeric id"))?;
        Ok(Self {
            id,
            fields: Record(map),
        })
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Human-readable rendering of a field; `None` for null or missing values.
    pub fn label_for(&self, field: &str) -> Option<String> {
        self.get(field).and_then(display_value)
    }

    /// Fields eligible for diffing (the id is never part of a change-set).
    pub fn as_change_set_source(&self) -> &Record {
        &self.fields
    }

    pub fn into_value(self) -> Value {
        let mut map = self.fields.0;
        map.insert("id".into(), Value::from(self.id));
        Value::Object(map)
    }
}

/// Render a scalar the way a text input would show it.
pub fn display_value(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Minimal set of field changes sent as a partial update.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet(Map<String, Value>);

impl ChangeSet {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub(crate) fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    pub fn to_record(&self) -> Record {
        Record(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_value_extracts_id() {
        let e = Entity::from_value(json!({"id": 7, "marca": "Acme"})).unwrap();
        assert_eq!(e.id, 7);
        assert_eq!(e.get("marca"), Some(&json!("Acme")));
        assert!(!e.as_change_set_source().contains("id"));
    }

    #[test]
    fn from_value_accepts_numeric_string_id() {
        let e = Entity::from_value(json!({"id": "12"})).unwrap();
        assert_eq!(e.id, 12);
    }

    #[test]
    fn from_value_rejects_missing_id_and_non_objects() {
        assert!(matches!(
            Entity::from_value(json!({"marca": "Acme"})),
            Err(CrudError::Transport(_))
        ));
        assert!(matches!(
            Entity::from_value(json!([1, 2])),
            Err(CrudError::Transport(_))
        ));
    }

    #[test]
    fn serde_round_trip_keeps_id_flat() {
        let e = Entity::new(3, Record::new().with("caja", json!("Banco")));
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v, json!({"id": 3, "caja": "Banco"}));
        let back: Entity = serde_json::from_value(v).unwrap();
        assert_eq!(back, e);
    }

    #[test]
    fn label_for_skips_null_and_empty() {
        let e = Entity::from_value(json!({"id": 1, "a": null, "b": "", "c": 4.5})).unwrap();
        assert_eq!(e.label_for("a"), None);
        assert_eq!(e.label_for("b"), None);
        assert_eq!(e.label_for("c").as_deref(), Some("4.5"));
        assert_eq!(e.label_for("missing"), None);
    }
}
