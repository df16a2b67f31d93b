//! In-process transport: dispatches requests into an axum Router without a socket.
//! Routes follow the collection/item layout `{prefix}/{model}` and `{prefix}/{model}/{id}`.

use super::{Transport, TransportError, TransportResponse};
use crate::entity::{ChangeSet, EntityId, Record};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Method, Request},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

/// Largest response body read back from the router.
const BODY_LIMIT: usize = 4 * 1024 * 1024;

#[derive(Clone)]
pub struct RouterTransport {
    router: Router,
    prefix: String,
}

impl RouterTransport {
    pub fn new(router: Router) -> Self {
        Self {
            router,
            prefix: String::new(),
        }
    }

    /// Mount point of the resource routes, e.g. "/api".
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    fn collection_uri(&self, model: &str) -> String {
        format!("{}/{}", self.prefix, model)
    }

    fn item_uri(&self, model: &str, id: EntityId) -> String {
        format!("{}/{}/{}", self.prefix, model, id)
    }

    async fn send(
        &self,
        method: Method,
        uri: String,
        body: Option<Value>,
    ) -> Result<TransportResponse, TransportError> {
        tracing::debug!(method = %method, uri = %uri, "dispatch");
        let builder = Request::builder().method(method).uri(&uri);
        let request = match body {
            Some(v) => {
                let bytes = serde_json::to_vec(&v).map_err(|e| TransportError::new(e.to_string()))?;
                builder
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(bytes))
            }
            None => builder.body(Body::empty()),
        }
        .map_err(|e| TransportError::new(e.to_string()))?;

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .map_err(|never| match never {})?;
        let status = response.status().as_u16();
        let bytes = axum::body::to_bytes(response.into_body(), BODY_LIMIT)
            .await
            .map_err(|e| TransportError::new(e.to_string()))?;
        let data = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        tracing::debug!(uri = %uri, status, "response");
        Ok(TransportResponse { status, data })
    }
}

#[async_trait]
impl Transport for RouterTransport {
    async fn create_resource(
        &self,
        model: &str,
        values: &Record,
    ) -> Result<TransportResponse, TransportError> {
        let uri = self.collection_uri(model);
        self.send(Method::POST, uri, Some(values.clone().into_value()))
            .await
    }

    async fn patch_resource(
        &self,
        model: &str,
        id: EntityId,
        change_set: &ChangeSet,
    ) -> Result<TransportResponse, TransportError> {
        let uri = self.item_uri(model, id);
        self.send(Method::PATCH, uri, Some(change_set.to_value())).await
    }

    async fn delete_resource(
        &self,
        model: &str,
        id: EntityId,
    ) -> Result<TransportResponse, TransportError> {
        let uri = self.item_uri(model, id);
        self.send(Method::DELETE, uri, None).await
    }

    async fn list_resources(
        &self,
        model: &str,
        query: &[(String, String)],
    ) -> Result<TransportResponse, TransportError> {
        let mut uri = self.collection_uri(model);
        if !query.is_empty() {
            let qs = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(query)
                .finish();
            uri.push('?');
            uri.push_str(&qs);
        }
        self.send(Method::GET, uri, None).await
    }
}
