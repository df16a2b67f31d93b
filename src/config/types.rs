//! Raw config types matching the JSON resource definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Suffix of the sibling attribute carrying a reference's display label.
pub const LABEL_SUFFIX: &str = "_label";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[serde(alias = "textarea", alias = "email")]
    Text,
    #[serde(alias = "number")]
    Numeric,
    Date,
    #[serde(alias = "combobox")]
    Reference,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRule {
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub allowed: Option<Vec<Value>>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
}

impl ValidationRule {
    pub fn is_empty(&self) -> bool {
        *self == ValidationRule::default()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(alias = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub label: Option<String>,
    /// Attribute of the instance holding the human label of a reference key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_label_field: Option<String>,
    /// Target model of a reference field (used by pickers, not by the engine).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "ValidationRule::is_empty")]
    pub validation: ValidationRule,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            label: None,
            reference_label_field: None,
            model: None,
            placeholder: None,
            default_value: None,
            validation: ValidationRule::default(),
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn numeric(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Numeric)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Date)
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Reference)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_label_field(mut self, field: impl Into<String>) -> Self {
        self.reference_label_field = Some(field.into());
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_validation(mut self, rule: ValidationRule) -> Self {
        self.validation = rule;
        self
    }

    pub fn is_reference(&self) -> bool {
        self.kind == FieldKind::Reference
    }

    /// Label shown next to the input; the field name when none is configured.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Sibling attribute read for the initial label of a reference field.
    /// e.g. "categoria" -> "categoria_label" unless configured otherwise.
    pub fn label_attribute(&self) -> Option<String> {
        if !self.is_reference() {
            return None;
        }
        Some(
            self.reference_label_field
                .clone()
                .unwrap_or_else(|| format!("{}{}", self.name, LABEL_SUFFIX)),
        )
    }

    /// Value the form starts with when nothing else is known.
    pub fn empty_value(&self) -> Value {
        match (&self.default_value, self.kind) {
            (Some(v), _) => v.clone(),
            (None, FieldKind::Reference) => Value::Null,
            (None, _) => Value::String(String::new()),
        }
    }
}

/// Ordered field list of one model. Order is display order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSchema {
    fields: Vec<FieldDescriptor>,
}

impl FieldSchema {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldDescriptor> {
        self.fields.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'a> IntoIterator for &'a FieldSchema {
    type Item = &'a FieldDescriptor;
    type IntoIter = std::slice::Iter<'a, FieldDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Grammatical gender of the display name; drives articles in messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[serde(alias = "el")]
    Masculine,
    #[serde(alias = "la")]
    Feminine,
}

impl Gender {
    pub fn article(self) -> &'static str {
        match self {
            Gender::Masculine => "el",
            Gender::Feminine => "la",
        }
    }

    pub fn object_pronoun(self) -> &'static str {
        match self {
            Gender::Masculine => "lo",
            Gender::Feminine => "la",
        }
    }

    /// Adjective/participle ending: "nuev-o", "eliminad-a".
    pub fn ending(self) -> &'static str {
        match self {
            Gender::Masculine => "o",
            Gender::Feminine => "a",
        }
    }
}

/// One resource definition: everything the CRUD factory needs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrudConfig {
    pub model: String,
    #[serde(alias = "nombre")]
    pub display_name: String,
    #[serde(alias = "prefijo")]
    pub gender: Gender,
    pub fields: FieldSchema,
    /// Overrides the default soft-delete confirmation text.
    #[serde(default, alias = "mensajeEliminar", skip_serializing_if = "Option::is_none")]
    pub delete_message: Option<String>,
}
