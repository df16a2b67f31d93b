//! Filter predicates and their translation into API lookup parameters.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    #[default]
    Equals,
    Contains,
    StartsWith,
    EndsWith,
    IsEmpty,
    IsNotEmpty,
    GreaterThan,
    LessThan,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::Contains => "contains",
            Operator::StartsWith => "startsWith",
            Operator::EndsWith => "endsWith",
            Operator::IsEmpty => "isEmpty",
            Operator::IsNotEmpty => "isNotEmpty",
            Operator::GreaterThan => "greaterThan",
            Operator::LessThan => "lessThan",
        }
    }

    /// Operators that match against text and therefore against a label column.
    fn matches_text(self) -> bool {
        matches!(
            self,
            Operator::Equals | Operator::Contains | Operator::StartsWith | Operator::EndsWith
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "equals" => Operator::Equals,
            "contains" => Operator::Contains,
            "startsWith" => Operator::StartsWith,
            "endsWith" => Operator::EndsWith,
            "isEmpty" => Operator::IsEmpty,
            "isNotEmpty" => Operator::IsNotEmpty,
            "greaterThan" => Operator::GreaterThan,
            "lessThan" => Operator::LessThan,
            other => return Err(format!("unknown operator: {}", other)),
        })
    }
}

/// One condition of the filter-set. A filter-set is the AND of its predicates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPredicate {
    pub id: String,
    pub field: String,
    pub operator: Operator,
    pub value: String,
}

impl FilterPredicate {
    /// New predicate with a fresh random id.
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), field, operator, value)
    }

    pub fn with_id(
        id: impl Into<String>,
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn targets(&self, field: &str) -> bool {
        self.field == field
    }

    /// Same field, operator and value; ids are ignored.
    pub fn same_condition(&self, other: &FilterPredicate) -> bool {
        self.field == other.field && self.operator == other.operator && self.value == other.value
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// List request parameters: filters as lookups plus ordering and free-text search.
#[derive(Clone, Debug, Default)]
pub struct ApiQuery {
    filters: Vec<FilterPredicate>,
    label_suffixes: HashMap<String, String>,
    ordering: Option<(String, SortDirection)>,
    search: Option<String>,
}

impl ApiQuery {
    pub fn new(filters: &[FilterPredicate]) -> Self {
        Self {
            filters: filters.to_vec(),
            ..Default::default()
        }
    }

    /// Text lookups on `field` go to `{field}{suffix}` (e.g. "proveedor" -> "proveedor_nombre").
    pub fn with_label_suffix(mut self, field: impl Into<String>, suffix: impl Into<String>) -> Self {
        self.label_suffixes.insert(field.into(), suffix.into());
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.ordering = Some((field.into(), direction));
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = to_api_query(&self.filters, &self.label_suffixes);
        if let Some((field, direction)) = &self.ordering {
            let sign = match direction {
                SortDirection::Asc => "",
                SortDirection::Desc => "-",
            };
            pairs.push(("ordering".into(), format!("{}{}", sign, field)));
        }
        if let Some(text) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search".into(), text.to_string()));
        }
        pairs
    }
}

/// Translate predicates into lookup parameters, one pair per predicate, in order.
pub fn to_api_query(
    filters: &[FilterPredicate],
    label_suffixes: &HashMap<String, String>,
) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|f| {
            let column = if f.operator.matches_text() {
                let suffix = label_suffixes.get(&f.field).map(String::as_str).unwrap_or("");
                format!("{}{}", f.field, suffix)
            } else {
                f.field.clone()
            };
            match f.operator {
                Operator::Equals => (column, f.value.clone()),
                Operator::Contains => (format!("{}__icontains", column), f.value.clone()),
                Operator::StartsWith => (format!("{}__startswith", column), f.value.clone()),
                Operator::EndsWith => (format!("{}__endswith", column), f.value.clone()),
                Operator::IsEmpty => (format!("{}__isnull", column), "true".into()),
                Operator::IsNotEmpty => (format!("{}__isnull", column), "false".into()),
                Operator::GreaterThan => (format!("{}__gt", column), f.value.clone()),
                Operator::LessThan => (format!("{}__lt", column), f.value.clone()),
            }
        })
        .collect()
}
