//! Transport seam: how operations reach the remote resource API.

mod router;

use crate::entity::{ChangeSet, EntityId, Record};
use crate::error::CrudError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

pub use router::RouterTransport;

/// Status the API answers a successful delete with. Nothing else counts as deleted.
pub const DELETE_SUCCESS_STATUS: u16 = 204;

/// HTTP-style response: status plus JSON body (`Null` when the body is empty).
#[derive(Clone, Debug, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub data: Value,
}

impl TransportResponse {
    pub fn new(status: u16, data: Value) -> Self {
        Self { status, data }
    }

    pub fn no_content() -> Self {
        Self::new(DELETE_SUCCESS_STATUS, Value::Null)
    }

    /// 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never produced a response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<TransportError> for CrudError {
    fn from(e: TransportError) -> Self {
        CrudError::transport(e.message)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn create_resource(
        &self,
        model: &str,
        values: &Record,
    ) -> Result<TransportResponse, TransportError>;

    async fn patch_resource(
        &self,
        model: &str,
        id: EntityId,
        change_set: &ChangeSet,
    ) -> Result<TransportResponse, TransportError>;

    async fn delete_resource(
        &self,
        model: &str,
        id: EntityId,
    ) -> Result<TransportResponse, TransportError>;

    /// Collection read with API lookup parameters (see `filter::to_api_query`).
    async fn list_resources(
        &self,
        model: &str,
        query: &[(String, String)],
    ) -> Result<TransportResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn create_resource(
        &self,
        model: &str,
        values: &Record,
    ) -> Result<TransportResponse, TransportError> {
        (**self).create_resource(model, values).await
    }

    async fn patch_resource(
        &self,
        model: &str,
        id: EntityId,
        change_set: &ChangeSet,
    ) -> Result<TransportResponse, TransportError> {
        (**self).patch_resource(model, id, change_set).await
    }

    async fn delete_resource(
        &self,
        model: &str,
        id: EntityId,
    ) -> Result<TransportResponse, TransportError> {
        (**self).delete_resource(model, id).await
    }

    async fn list_resources(
        &self,
        model: &str,
        query: &[(String, String)],
    ) -> Result<TransportResponse, TransportError> {
        (**self).list_resources(model, query).await
    }
}
