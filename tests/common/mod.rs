//! In-memory REST backend and transport wrappers shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{patch, post},
    Json, Router,
};
use resource_sdk::{
    ChangeSet, CrudConfig, Entity, EntityId, FieldDescriptor, FieldSchema, Gender, Record,
    RouterTransport, Transport, TransportError, TransportResponse, ValidationRule,
};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Default)]
struct Store {
    rows: BTreeMap<EntityId, Map<String, Value>>,
    next_id: EntityId,
    patches: Vec<Value>,
    queries: Vec<HashMap<String, String>>,
}

/// Django-style backend: POST/GET on the collection, PATCH/DELETE on items.
/// A row with `"en_uso": true` cannot be deleted and answers 200 with a message.
#[derive(Clone, Default)]
pub struct Backend {
    store: Arc<Mutex<Store>>,
}

impl Backend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, row: Value) -> Entity {
        let entity = Entity::from_value(row.clone()).unwrap();
        let mut store = self.store.lock().unwrap();
        store.next_id = store.next_id.max(entity.id);
        store
            .rows
            .insert(entity.id, row.as_object().cloned().unwrap());
        entity
    }

    pub fn row(&self, id: EntityId) -> Option<Value> {
        self.store
            .lock()
            .unwrap()
            .rows
            .get(&id)
            .cloned()
            .map(Value::Object)
    }

    pub fn row_count(&self) -> usize {
        self.store.lock().unwrap().rows.len()
    }

    pub fn patches(&self) -> Vec<Value> {
        self.store.lock().unwrap().patches.clone()
    }

    pub fn queries(&self) -> Vec<HashMap<String, String>> {
        self.store.lock().unwrap().queries.clone()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/:model", post(create).get(list))
            .route("/api/:model/:id", patch(update).delete(remove))
            .with_state(self.clone())
    }

    pub fn transport(&self) -> RouterTransport {
        RouterTransport::new(self.router()).with_prefix("/api")
    }
}

async fn create(
    State(backend): State<Backend>,
    Path(_model): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if body.get("nombre") == Some(&json!("duplicado")) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"nombre": ["ya existe un registro con este nombre"]})),
        )
            .into_response();
    }
    let mut store = backend.store.lock().unwrap();
    store.next_id += 1;
    let id = store.next_id;
    let mut row = body.as_object().cloned().unwrap_or_default();
    row.insert("id".into(), json!(id));
    store.rows.insert(id, row.clone());
    (StatusCode::CREATED, Json(Value::Object(row))).into_response()
}

async fn list(
    State(backend): State<Backend>,
    Path(_model): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mut store = backend.store.lock().unwrap();
    store.queries.push(params);
    let rows: Vec<Value> = store.rows.values().cloned().map(Value::Object).collect();
    Json(json!({"count": rows.len(), "results": rows})).into_response()
}

async fn update(
    State(backend): State<Backend>,
    Path((_model, id)): Path<(String, EntityId)>,
    Json(body): Json<Value>,
) -> Response {
    let mut store = backend.store.lock().unwrap();
    store.patches.push(body.clone());
    let Some(row) = store.rows.get_mut(&id) else {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "No encontrado."}))).into_response();
    };
    if let Value::Object(changes) = body {
        for (k, v) in changes {
            row.insert(k, v);
        }
    }
    Json(Value::Object(row.clone())).into_response()
}

async fn remove(
    State(backend): State<Backend>,
    Path((_model, id)): Path<(String, EntityId)>,
) -> Response {
    let mut store = backend.store.lock().unwrap();
    let in_use = store
        .rows
        .get(&id)
        .and_then(|r| r.get("en_uso"))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if in_use {
        return (
            StatusCode::OK,
            Json(json!({"message": "el registro está en uso"})),
        )
            .into_response();
    }
    match store.rows.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"detail": "No encontrado."}))).into_response(),
    }
}

/// Counts calls and holds each one until `release` is notified.
#[derive(Clone)]
pub struct GatedTransport {
    inner: RouterTransport,
    calls: Arc<AtomicUsize>,
    pub release: Arc<Notify>,
}

impl GatedTransport {
    pub fn new(inner: RouterTransport) -> Self {
        Self {
            inner,
            calls: Arc::new(AtomicUsize::new(0)),
            release: Arc::new(Notify::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.release.notified().await;
    }
}

#[async_trait]
impl Transport for GatedTransport {
    async fn create_resource(
        &self,
        model: &str,
        values: &Record,
    ) -> Result<TransportResponse, TransportError> {
        self.enter().await;
        self.inner.create_resource(model, values).await
    }

    async fn patch_resource(
        &self,
        model: &str,
        id: EntityId,
        change_set: &ChangeSet,
    ) -> Result<TransportResponse, TransportError> {
        self.enter().await;
        self.inner.patch_resource(model, id, change_set).await
    }

    async fn delete_resource(
        &self,
        model: &str,
        id: EntityId,
    ) -> Result<TransportResponse, TransportError> {
        self.enter().await;
        self.inner.delete_resource(model, id).await
    }

    async fn list_resources(
        &self,
        model: &str,
        query: &[(String, String)],
    ) -> Result<TransportResponse, TransportError> {
        self.enter().await;
        self.inner.list_resources(model, query).await
    }
}

/// Counts calls without holding them.
#[derive(Clone)]
pub struct CountingTransport {
    inner: RouterTransport,
    calls: Arc<AtomicUsize>,
}

impl CountingTransport {
    pub fn new(inner: RouterTransport) -> Self {
        Self {
            inner,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for CountingTransport {
    async fn create_resource(
        &self,
        model: &str,
        values: &Record,
    ) -> Result<TransportResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.create_resource(model, values).await
    }

    async fn patch_resource(
        &self,
        model: &str,
        id: EntityId,
        change_set: &ChangeSet,
    ) -> Result<TransportResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.patch_resource(model, id, change_set).await
    }

    async fn delete_resource(
        &self,
        model: &str,
        id: EntityId,
    ) -> Result<TransportResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_resource(model, id).await
    }

    async fn list_resources(
        &self,
        model: &str,
        query: &[(String, String)],
    ) -> Result<TransportResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list_resources(model, query).await
    }
}

/// Every call fails before reaching a backend, as a dropped connection would.
#[derive(Clone)]
pub struct FailingTransport {
    message: String,
}

impl FailingTransport {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn fail(&self) -> Result<TransportResponse, TransportError> {
        Err(TransportError::new(self.message.clone()))
    }
}

#[async_trait]
impl Transport for FailingTransport {
    async fn create_resource(
        &self,
        _model: &str,
        _values: &Record,
    ) -> Result<TransportResponse, TransportError> {
        self.fail()
    }

    async fn patch_resource(
        &self,
        _model: &str,
        _id: EntityId,
        _change_set: &ChangeSet,
    ) -> Result<TransportResponse, TransportError> {
        self.fail()
    }

    async fn delete_resource(
        &self,
        _model: &str,
        _id: EntityId,
    ) -> Result<TransportResponse, TransportError> {
        self.fail()
    }

    async fn list_resources(
        &self,
        _model: &str,
        _query: &[(String, String)],
    ) -> Result<TransportResponse, TransportError> {
        self.fail()
    }
}

/// `proveedor` resource: required name, numeric balance, reference to a category.
pub fn proveedor_config() -> CrudConfig {
    CrudConfig {
        model: "proveedor".into(),
        display_name: "Proveedor".into(),
        gender: Gender::Masculine,
        fields: FieldSchema::new(vec![
            FieldDescriptor::text("nombre").with_validation(ValidationRule {
                required: Some(true),
                ..Default::default()
            }),
            FieldDescriptor::numeric("saldo"),
            FieldDescriptor::reference("categoria").with_label_field("categoria_nombre"),
        ]),
        delete_message: None,
    }
}

/// Route library logs to the test harness; `RUST_LOG=resource_sdk=debug` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn record(value: Value) -> Record {
    Record::from(value.as_object().cloned().unwrap())
}
