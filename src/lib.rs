//! Resource SDK: configuration-driven CRUD orchestration for REST resources.
//!
//! A resource is described once by a [`CrudConfig`]; [`CrudFactory`] turns it into
//! create/update/delete dialog flows backed by [`ResourceOperations`], and
//! [`FilterUrlSync`] keeps list filters and the page URL in agreement.

pub mod config;
pub mod crud;
pub mod entity;
pub mod error;
pub mod filter;
pub mod service;
pub mod sink;
pub mod transport;
pub mod url_sync;

pub use config::{
    load_registry_from_path, load_registry_from_str, CrudConfig, FieldDescriptor, FieldKind,
    FieldSchema, Gender, ResourceRegistry, ValidationRule,
};
pub use crud::{
    BoundField, CreateDialog, CrudFactory, DeleteDialog, DialogState, FlowOutcome, UpdateDialog,
};
pub use entity::{ChangeSet, Entity, EntityId, Record};
pub use error::{ConfigError, CrudError};
pub use filter::{to_api_query, ApiQuery, FilterPredicate, Operator, SortDirection};
pub use service::{compute_change_set, Coercion, DiffEngine, ResourceOperations, UpdateOutcome};
pub use sink::{ListSink, Notification, Notifier, RecordingNotifier, ResourceList, TracingNotifier};
pub use transport::{
    RouterTransport, Transport, TransportError, TransportResponse, DELETE_SUCCESS_STATUS,
};
pub use url_sync::{BrowserLocation, FilterUrlSync, QueryParams, UrlAccessor, UrlSyncOptions};
