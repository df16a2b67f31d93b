//! Form validation from field rules, run before anything reaches the transport.

use crate::config::{FieldDescriptor, FieldKind, FieldSchema, ValidationRule};
use crate::entity::Record;
use crate::error::CrudError;
use crate::service::diff::parse_number;
use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;

pub struct RequestValidator;

impl RequestValidator {
    /// Validate values against every field of the schema. Required fields must be present.
    pub fn validate(values: &Record, schema: &FieldSchema) -> Result<(), CrudError> {
        let mut problems = Vec::new();
        for field in schema {
            let val = values.get(&field.name);
            if field.validation.required == Some(true) && is_blank(val) {
                problems.push(format!("{}: es obligatorio", field.name));
                continue;
            }
            if let Some(v) = val {
                if let Err(msg) = validate_field(field, v) {
                    problems.push(format!("{}: {}", field.name, msg));
                }
            }
        }
        into_result(problems)
    }

    /// Validate only the fields present in values (for partial updates).
    /// A present-but-blank required field still fails: it would clear the value.
    pub fn validate_partial(values: &Record, schema: &FieldSchema) -> Result<(), CrudError> {
        let mut problems = Vec::new();
        for (name, v) in values {
            let Some(field) = schema.field(name) else {
                continue;
            };
            if field.validation.required == Some(true) && is_blank(Some(v)) {
                problems.push(format!("{}: es obligatorio", name));
                continue;
            }
            if let Err(msg) = validate_field(field, v) {
                problems.push(format!("{}: {}", name, msg));
            }
        }
        into_result(problems)
    }
}

fn into_result(problems: Vec<String>) -> Result<(), CrudError> {
    if problems.is_empty() {
        Ok(())
    } else {
        Err(CrudError::local_validation(problems.join("; ")))
    }
}

fn is_blank(v: Option<&Value>) -> bool {
    match v {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn validate_field(field: &FieldDescriptor, v: &Value) -> Result<(), String> {
    if is_blank(Some(v)) {
        return Ok(());
    }
    validate_kind(field.kind, v)?;
    validate_rule(v, &field.validation)
}

fn validate_kind(kind: FieldKind, v: &Value) -> Result<(), String> {
    match kind {
        FieldKind::Numeric => {
            let ok = v.is_number() || v.as_str().and_then(parse_number).is_some();
            if !ok {
                return Err("debe ser un número".into());
            }
        }
        FieldKind::Date => {
            let ok = v
                .as_str()
                .map(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").is_ok())
                .unwrap_or(false);
            if !ok {
                return Err("debe ser una fecha válida (AAAA-MM-DD)".into());
            }
        }
        FieldKind::Text | FieldKind::Reference => {}
    }
    Ok(())
}

fn validate_rule(v: &Value, rule: &ValidationRule) -> Result<(), String> {
    if let Some(format) = &rule.format {
        validate_format(v, format)?;
    }
    if let Some(s) = v.as_str() {
        let len = s.chars().count();
        if let Some(max) = rule.max_length {
            if len > max as usize {
                return Err(format!("debe tener como máximo {} caracteres", max));
            }
        }
        if let Some(min) = rule.min_length {
            if len < min as usize {
                return Err(format!("debe tener al menos {} caracteres", min));
            }
        }
        if let Some(ref pattern) = rule.pattern {
            let re = Regex::new(pattern).map_err(|_| "patrón de validación inválido".to_string())?;
            if !re.is_match(s) {
                return Err("no tiene el formato requerido".into());
            }
        }
    }
    if let Some(ref allowed) = rule.allowed {
        if !allowed.iter().any(|a| value_eq(v, a)) {
            return Err(format!(
                "debe ser uno de: {}",
                allowed.iter().take(5).map(|a| a.to_string()).collect::<Vec<_>>().join(", ")
            ));
        }
    }
    let n = v.as_f64().or_else(|| v.as_str().and_then(parse_number).and_then(|n| n.as_f64()));
    if let Some(n) = n {
        if let Some(min) = rule.minimum {
            if n < min {
                return Err(format!("debe ser al menos {}", min));
            }
        }
        if let Some(max) = rule.maximum {
            if n > max {
                return Err(format!("debe ser como máximo {}", max));
            }
        }
    }
    Ok(())
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(s), Value::String(t)) => s == t,
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

fn validate_format(v: &Value, format: &str) -> Result<(), String> {
    let Some(s) = v.as_str() else {
        return Ok(());
    };
    match format.to_lowercase().as_str() {
        "email" => {
            if !s.contains('@') || s.len() < 3 {
                return Err("debe ser un email válido".into());
            }
        }
        "uuid" => {
            if uuid::Uuid::parse_str(s).is_err() {
                return Err("debe ser un UUID válido".into());
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> FieldSchema {
        FieldSchema::new(vec![
            FieldDescriptor::text("marca").with_validation(ValidationRule {
                required: Some(true),
                max_length: Some(5),
                ..Default::default()
            }),
            FieldDescriptor::numeric("saldo").with_validation(ValidationRule {
                minimum: Some(0.0),
                ..Default::default()
            }),
            FieldDescriptor::date("fecha"),
            FieldDescriptor::text("mail").with_validation(ValidationRule {
                format: Some("email".into()),
                ..Default::default()
            }),
        ])
    }

    fn message(result: Result<(), CrudError>) -> String {
        match result {
            Err(CrudError::Validation { status: None, message }) => message,
            other => panic!("expected local validation failure, got {:?}", other),
        }
    }

    #[test]
    fn accepts_valid_values() {
        let values = Record::new()
            .with("marca", json!("Acme"))
            .with("saldo", json!("10.5"))
            .with("fecha", json!("2024-03-01"))
            .with("mail", json!(""));
        assert!(RequestValidator::validate(&values, &schema()).is_ok());
    }

    #[test]
    fn aggregates_every_problem() {
        let values = Record::new()
            .with("saldo", json!(-1))
            .with("fecha", json!("01/03/2024"));
        let msg = message(RequestValidator::validate(&values, &schema()));
        assert!(msg.contains("marca: es obligatorio"));
        assert!(msg.contains("saldo: debe ser al menos 0"));
        assert!(msg.contains("fecha: debe ser una fecha válida"));
    }

    #[test]
    fn numeric_kind_rejects_words() {
        let values = Record::new().with("marca", json!("ok")).with("saldo", json!("diez"));
        let msg = message(RequestValidator::validate(&values, &schema()));
        assert_eq!(msg, "saldo: debe ser un número");
    }

    #[test]
    fn partial_ignores_missing_required_fields() {
        let values = Record::new().with("saldo", json!(3));
        assert!(RequestValidator::validate_partial(&values, &schema()).is_ok());
    }

    #[test]
    fn partial_rejects_clearing_required_field() {
        let values = Record::new().with("marca", json!(""));
        let msg = message(RequestValidator::validate_partial(&values, &schema()));
        assert_eq!(msg, "marca: es obligatorio");
    }

    #[test]
    fn max_length_counts_characters() {
        let values = Record::new().with("marca", json!("ñandú"));
        assert!(RequestValidator::validate_partial(&values, &schema()).is_ok());
        let values = Record::new().with("marca", json!("ñandús"));
        assert!(RequestValidator::validate_partial(&values, &schema()).is_err());
    }

    #[test]
    fn email_format_is_checked() {
        let values = Record::new().with("mail", json!("nope"));
        let msg = message(RequestValidator::validate_partial(&values, &schema()));
        assert_eq!(msg, "mail: debe ser un email válido");
    }
}
