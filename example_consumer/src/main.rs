//! Example consumer: a separate Rust project that uses resource-sdk as a dependency.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Or from this directory: `cargo run`
//!
//! Environment: `RESOURCE_SDK_CONFIG` points at a resource registry JSON file
//! (a built-in `proveedor` definition is used when unset); `RESOURCE_SDK_ORIGIN`
//! is the page URL used for filter sync.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{patch, post},
    Json, Router,
};
use resource_sdk::{
    load_registry_from_path, load_registry_from_str, BrowserLocation, CrudFactory,
    FilterPredicate, FilterUrlSync, Operator, Record, ResourceList, RouterTransport,
    UrlSyncOptions,
};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

const BUILTIN_REGISTRY: &str = r#"{
    "resources": [{
        "model": "proveedor",
        "displayName": "Proveedor",
        "gender": "masculine",
        "fields": [
            {"name": "nombre", "kind": "text", "label": "Nombre", "validation": {"required": true}},
            {"name": "saldo", "kind": "numeric", "label": "Saldo"},
            {"name": "categoria", "kind": "reference", "referenceLabelField": "categoria_nombre"}
        ]
    }]
}"#;

type Rows = Arc<Mutex<BTreeMap<i64, Map<String, Value>>>>;

fn backend() -> Router {
    let rows: Rows = Arc::default();
    Router::new()
        .route("/api/:model", post(create))
        .route("/api/:model/:id", patch(update).delete(remove))
        .with_state(rows)
}

async fn create(State(rows): State<Rows>, Json(body): Json<Value>) -> Response {
    let mut rows = rows.lock().unwrap_or_else(|e| e.into_inner());
    let id = rows.keys().next_back().copied().unwrap_or(0) + 1;
    let mut row = body.as_object().cloned().unwrap_or_default();
    row.insert("id".into(), json!(id));
    rows.insert(id, row.clone());
    (StatusCode::CREATED, Json(Value::Object(row))).into_response()
}

async fn update(
    State(rows): State<Rows>,
    Path((_model, id)): Path<(String, i64)>,
    Json(body): Json<Value>,
) -> Response {
    let mut rows = rows.lock().unwrap_or_else(|e| e.into_inner());
    let Some(row) = rows.get_mut(&id) else {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "No encontrado."}))).into_response();
    };
    if let Value::Object(changes) = body {
        row.extend(changes);
    }
    Json(Value::Object(row.clone())).into_response()
}

async fn remove(State(rows): State<Rows>, Path((_model, id)): Path<(String, i64)>) -> Response {
    let mut rows = rows.lock().unwrap_or_else(|e| e.into_inner());
    match rows.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"detail": "No encontrado."}))).into_response(),
    }
}

fn values(v: Value) -> Record {
    v.as_object().cloned().map(Record::from).unwrap_or_default()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("resource_sdk=info")),
        )
        .init();

    let registry = match std::env::var("RESOURCE_SDK_CONFIG") {
        Ok(path) => load_registry_from_path(path)?,
        Err(_) => load_registry_from_str(BUILTIN_REGISTRY)?,
    };
    let config = registry.require("proveedor")?.clone();

    let transport = RouterTransport::new(backend()).with_prefix("/api");
    let crud = CrudFactory::new(config, transport);
    let list = ResourceList::default();

    let create = crud.create_dialog();
    create.open();
    let outcome = create
        .submit(&values(json!({"nombre": "Roca", "saldo": "120"})), &list)
        .await;
    tracing::info!(?outcome, rows = list.len(), "create");

    let Some(created) = list.snapshot().into_iter().next() else {
        return Err("create did not add a row".into());
    };

    let update = crud.update_dialog(created.clone());
    update.open();
    let outcome = update
        .submit(&values(json!({"nombre": "Roca SA", "saldo": 120})), &list)
        .await;
    tracing::info!(?outcome, "update");

    let delete = crud.delete_dialog(created);
    tracing::info!(message = %delete.message(), "delete confirmation");
    delete.open();
    let outcome = delete.confirm(&list).await;
    tracing::info!(?outcome, rows = list.len(), "delete");

    let origin = std::env::var("RESOURCE_SDK_ORIGIN")
        .unwrap_or_else(|_| "http://localhost:3000/proveedores".into());
    let mut sync = FilterUrlSync::new(BrowserLocation::parse(&origin)?, UrlSyncOptions::default());
    sync.commit(vec![
        FilterPredicate::new("estado", Operator::Equals, "activo"),
        FilterPredicate::new("id", Operator::Equals, "7"),
    ]);
    tracing::info!(url = %sync.location().href(), share = %sync.to_shareable_url(), "filters");

    Ok(())
}
