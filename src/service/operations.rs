//! Generic create/update/delete/list for one model over a `Transport`.

use crate::config::FieldSchema;
use crate::entity::{Entity, Record};
use crate::error::{CrudError, UNKNOWN_ERROR};
use crate::filter::ApiQuery;
use crate::service::diff::{Coercion, DiffEngine};
use crate::service::validation::RequestValidator;
use crate::transport::{Transport, TransportResponse, DELETE_SUCCESS_STATUS};
use serde_json::Value;

/// Result of an update: the server copy, or the original when nothing changed.
#[derive(Clone, Debug, PartialEq)]
pub enum UpdateOutcome {
    Unchanged(Entity),
    Updated(Entity),
}

impl UpdateOutcome {
    pub fn entity(&self) -> &Entity {
        match self {
            UpdateOutcome::Unchanged(e) | UpdateOutcome::Updated(e) => e,
        }
    }

    pub fn into_entity(self) -> Entity {
        match self {
            UpdateOutcome::Unchanged(e) | UpdateOutcome::Updated(e) => e,
        }
    }

    pub fn is_updated(&self) -> bool {
        matches!(self, UpdateOutcome::Updated(_))
    }
}

pub struct ResourceOperations<T> {
    model: String,
    schema: FieldSchema,
    transport: T,
    coercion: Coercion,
}

impl<T: Transport> ResourceOperations<T> {
    pub fn new(model: impl Into<String>, schema: FieldSchema, transport: T) -> Self {
        Self {
            model: model.into(),
            schema,
            transport,
            coercion: Coercion::default(),
        }
    }

    pub fn with_coercion(mut self, coercion: Coercion) -> Self {
        self.coercion = coercion;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Submit values verbatim. Returns the entity with its server-assigned id.
    pub async fn create(&self, values: &Record) -> Result<Entity, CrudError> {
        RequestValidator::validate(values, &self.schema)?;
        tracing::debug!(model = %self.model, fields = values.len(), "create");
        let res = self.transport.create_resource(&self.model, values).await?;
        let res = expect_success(res)?;
        Entity::from_value(res.data)
    }

    /// Send only the changed fields. An empty diff makes no network call.
    /// The returned entity is the server's copy and replaces the local one.
    pub async fn update(&self, original: &Entity, edited: &Record) -> Result<UpdateOutcome, CrudError> {
        let change_set = DiffEngine::compute_with(self.coercion, &self.schema, original, edited);
        if change_set.is_empty() {
            tracing::debug!(model = %self.model, id = original.id, "update skipped: no changes");
            return Ok(UpdateOutcome::Unchanged(original.clone()));
        }
        RequestValidator::validate_partial(&change_set.to_record(), &self.schema)?;
        tracing::debug!(
            model = %self.model,
            id = original.id,
            fields = ?change_set.fields().collect::<Vec<_>>(),
            "patch"
        );
        let res = self
            .transport
            .patch_resource(&self.model, original.id, &change_set)
            .await?;
        let res = expect_success(res)?;
        Ok(UpdateOutcome::Updated(Entity::from_value(res.data)?))
    }

    /// Delete by id. Only `204 No Content` means deleted; any other status,
    /// a `200` with an explanatory body included, is a rejection.
    pub async fn delete(&self, entity: &Entity) -> Result<(), CrudError> {
        tracing::debug!(model = %self.model, id = entity.id, "delete");
        let res = self.transport.delete_resource(&self.model, entity.id).await?;
        if res.status == DELETE_SUCCESS_STATUS {
            return Ok(());
        }
        Err(CrudError::rejected(res.status, server_message(&res.data)))
    }

    /// Fetch the collection. Accepts a bare array or a paginated `{ "results": [...] }` body.
    pub async fn list(&self, query: &ApiQuery) -> Result<Vec<Entity>, CrudError> {
        let pairs = query.to_pairs();
        let res = self.transport.list_resources(&self.model, &pairs).await?;
        let res = expect_success(res)?;
        let rows = match res.data {
            Value::Array(rows) => rows,
            Value::Object(mut map) => match map.remove("results") {
                Some(Value::Array(rows)) => rows,
                _ => return Err(CrudError::transport("list response has no results")),
            },
            _ => return Err(CrudError::transport("list response is not a collection")),
        };
        rows.into_iter().map(Entity::from_value).collect()
    }
}

fn expect_success(res: TransportResponse) -> Result<TransportResponse, CrudError> {
    if res.is_success() {
        Ok(res)
    } else {
        Err(CrudError::rejected(res.status, server_message(&res.data)))
    }
}

/// Best human-readable message in an error body.
/// Tries `message`, `error` (string or `{ "message" }` envelope), `detail`,
/// then a field -> messages mapping, then the first array element.
pub fn server_message(data: &Value) -> String {
    match data {
        Value::String(s) if !s.trim().is_empty() => s.clone(),
        Value::Object(map) => {
            for key in ["message", "error", "detail"] {
                match map.get(key) {
                    Some(Value::String(s)) if !s.trim().is_empty() => return s.clone(),
                    Some(Value::Object(inner)) => {
                        if let Some(Value::String(s)) = inner.get("message") {
                            return s.clone();
                        }
                    }
                    _ => {}
                }
            }
            if map.is_empty() {
                return UNKNOWN_ERROR.to_string();
            }
            map.iter()
                .map(|(field, messages)| format!("{}: {}", field, join_messages(messages)))
                .collect::<Vec<_>>()
                .join("; ")
        }
        Value::Array(items) => items
            .first()
            .map(join_messages)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
        _ => UNKNOWN_ERROR.to_string(),
    }
}

fn join_messages(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(join_messages).collect::<Vec<_>>().join(", "),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
