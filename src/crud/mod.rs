//! CRUD factory: one resource definition in, create/update/delete dialog flows out.
//!
//! Flows catch every error at their boundary: the user gets a notification,
//! the dialog gets its error flag, and the caller's list is left untouched.

mod dialog;
pub mod messages;

use crate::config::{CrudConfig, FieldDescriptor};
use crate::entity::{Entity, Record};
use crate::error::CrudError;
use crate::service::{ResourceOperations, UpdateOutcome};
use crate::sink::{ListSink, Notifier, TracingNotifier};
use crate::transport::Transport;
use dialog::{DialogHandle, Settled};
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};

pub use dialog::DialogState;

/// How a submission ended, from the caller's point of view.
#[derive(Clone, Debug, PartialEq)]
pub enum FlowOutcome {
    /// The server confirmed and the list mutation was proposed.
    Applied,
    /// Nothing changed; no request was sent and the dialog closed.
    Unchanged,
    /// The dialog was closed before the response arrived; it was dropped.
    Discarded,
    Rejected(CrudError),
}

impl FlowOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, FlowOutcome::Applied)
    }
}

/// A field as a form renders it: descriptor plus starting value and label.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundField {
    pub descriptor: FieldDescriptor,
    pub initial_value: Value,
    /// Text shown before the user interacts (the display label for references).
    pub initial_label: Option<String>,
}

struct Shared<T> {
    config: Arc<CrudConfig>,
    operations: Arc<ResourceOperations<T>>,
    notifier: Arc<dyn Notifier>,
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            operations: Arc::clone(&self.operations),
            notifier: Arc::clone(&self.notifier),
        }
    }
}

pub struct CrudFactory<T> {
    shared: Shared<T>,
}

impl<T: Transport> CrudFactory<T> {
    pub fn new(config: CrudConfig, transport: T) -> Self {
        let operations = ResourceOperations::new(config.model.clone(), config.fields.clone(), transport);
        Self::from_operations(config, operations)
    }

    /// Use pre-built operations, e.g. with a non-default diff coercion.
    pub fn from_operations(config: CrudConfig, operations: ResourceOperations<T>) -> Self {
        Self {
            shared: Shared {
                config: Arc::new(config),
                operations: Arc::new(operations),
                notifier: Arc::new(TracingNotifier),
            },
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.shared.notifier = notifier;
        self
    }

    pub fn config(&self) -> &CrudConfig {
        &self.shared.config
    }

    pub fn operations(&self) -> &ResourceOperations<T> {
        &self.shared.operations
    }

    pub fn create_dialog(&self) -> CreateDialog<T> {
        CreateDialog {
            shared: self.shared.clone(),
            handle: DialogHandle::new(),
        }
    }

    pub fn update_dialog(&self, instancia: Entity) -> UpdateDialog<T> {
        UpdateDialog {
            shared: self.shared.clone(),
            handle: DialogHandle::new(),
            instancia: Arc::new(Mutex::new(instancia)),
        }
    }

    pub fn delete_dialog(&self, instancia: Entity) -> DeleteDialog<T> {
        DeleteDialog {
            shared: self.shared.clone(),
            handle: DialogHandle::new(),
            instancia,
        }
    }
}

macro_rules! dialog_controls {
    () => {
        pub fn open(&self) {
            self.handle.open();
        }

        /// Close the dialog. A request still in flight will have its response discarded.
        pub fn close(&self) {
            self.handle.close();
        }

        pub fn state(&self) -> DialogState {
            self.handle.state()
        }

        pub fn is_open(&self) -> bool {
            self.state() != DialogState::Closed
        }

        pub fn is_sending(&self) -> bool {
            self.state() == DialogState::Submitting
        }

        pub fn has_error(&self) -> bool {
            self.state() == DialogState::Open { error: true }
        }
    };
}

fn refused(error: CrudError) -> FlowOutcome {
    tracing::warn!(error = %error, "submission refused");
    FlowOutcome::Rejected(error)
}

fn discarded(model: &str) -> FlowOutcome {
    tracing::warn!(model = %model, "response arrived after the dialog closed; discarded");
    FlowOutcome::Discarded
}

/// Clones share the same dialog instance.
pub struct CreateDialog<T> {
    shared: Shared<T>,
    handle: DialogHandle,
}

impl<T> Clone for CreateDialog<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            handle: self.handle.clone(),
        }
    }
}

impl<T: Transport> CreateDialog<T> {
    dialog_controls!();

    pub fn title(&self) -> String {
        messages::create_title(&self.shared.config)
    }

    pub fn description(&self) -> String {
        messages::create_description(&self.shared.config)
    }

    pub fn fields(&self) -> Vec<BoundField> {
        self.shared
            .config
            .fields
            .iter()
            .map(|f| BoundField {
                descriptor: f.clone(),
                initial_value: f.empty_value(),
                initial_label: None,
            })
            .collect()
    }

    pub fn initial_values(&self) -> Record {
        self.shared
            .config
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.empty_value()))
            .collect()
    }

    /// Create the entity and propose `add_item` on success.
    pub async fn submit(&self, values: &Record, list: &dyn ListSink) -> FlowOutcome {
        let cfg = &self.shared.config;
        match self.handle.run(self.shared.operations.create(values)).await {
            Settled::Refused(e) => refused(e),
            Settled::Stale => discarded(&cfg.model),
            Settled::Done(Ok(entity)) => {
                tracing::info!(model = %cfg.model, id = entity.id, "created");
                list.add_item(entity);
                self.shared.notifier.notify_success(messages::CREATED);
                FlowOutcome::Applied
            }
            Settled::Done(Err(e)) => {
                self.shared
                    .notifier
                    .notify_error(&messages::create_failed(&e.user_message()));
                FlowOutcome::Rejected(e)
            }
        }
    }
}

/// Edit flow bound to one instance. Clones share the same dialog instance,
/// including the bound entity, which tracks the server's latest copy.
pub struct UpdateDialog<T> {
    shared: Shared<T>,
    handle: DialogHandle,
    instancia: Arc<Mutex<Entity>>,
}

impl<T> Clone for UpdateDialog<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            handle: self.handle.clone(),
            instancia: Arc::clone(&self.instancia),
        }
    }
}

impl<T: Transport> UpdateDialog<T> {
    dialog_controls!();

    /// The bound entity; after a successful submit, the server's copy.
    pub fn instancia(&self) -> Entity {
        self.instancia
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn title(&self) -> String {
        messages::update_title(&self.shared.config)
    }

    pub fn description(&self) -> String {
        messages::update_description(&self.shared.config)
    }

    /// Fields with the instance's values. Reference fields carry the display
    /// label from their sibling attribute, or the bare key when there is none.
    pub fn fields(&self) -> Vec<BoundField> {
        let instancia = self.instancia();
        self.shared
            .config
            .fields
            .iter()
            .map(|f| {
                let initial_label = f
                    .label_attribute()
                    .and_then(|attr| instancia.label_for(&attr))
                    .or_else(|| instancia.label_for(&f.name));
                BoundField {
                    descriptor: f.clone(),
                    initial_value: initial_value(&instancia, f),
                    initial_label,
                }
            })
            .collect()
    }

    pub fn initial_values(&self) -> Record {
        let instancia = self.instancia();
        self.shared
            .config
            .fields
            .iter()
            .map(|f| (f.name.clone(), initial_value(&instancia, f)))
            .collect()
    }

    /// Diff against the bound instance and patch; on success propose
    /// `update_item` with the server's copy.
    pub async fn submit(&self, edited: &Record, list: &dyn ListSink) -> FlowOutcome {
        let cfg = &self.shared.config;
        let original = self.instancia();
        let op = self.shared.operations.update(&original, edited);
        match self.handle.run(op).await {
            Settled::Refused(e) => refused(e),
            Settled::Stale => discarded(&cfg.model),
            Settled::Done(Ok(UpdateOutcome::Unchanged(_))) => FlowOutcome::Unchanged,
            Settled::Done(Ok(UpdateOutcome::Updated(entity))) => {
                tracing::info!(model = %cfg.model, id = entity.id, "updated");
                *self.instancia.lock().unwrap_or_else(PoisonError::into_inner) = entity.clone();
                list.update_item(entity);
                self.shared.notifier.notify_success(&messages::updated(cfg));
                FlowOutcome::Applied
            }
            Settled::Done(Err(e)) => {
                self.shared
                    .notifier
                    .notify_error(&messages::update_failed(cfg, &e.user_message()));
                FlowOutcome::Rejected(e)
            }
        }
    }
}

fn initial_value(instancia: &Entity, f: &FieldDescriptor) -> Value {
    match instancia.get(&f.name) {
        Some(v) if !v.is_null() => v.clone(),
        _ => f.empty_value(),
    }
}

/// Confirmation flow bound to one instance.
pub struct DeleteDialog<T> {
    shared: Shared<T>,
    handle: DialogHandle,
    instancia: Entity,
}

impl<T> Clone for DeleteDialog<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            handle: self.handle.clone(),
            instancia: self.instancia.clone(),
        }
    }
}

impl<T: Transport> DeleteDialog<T> {
    dialog_controls!();

    pub fn instancia(&self) -> &Entity {
        &self.instancia
    }

    pub fn message(&self) -> String {
        messages::delete_confirmation(&self.shared.config)
    }

    /// Delete after the user confirmed; propose `remove_item` only on 204.
    pub async fn confirm(&self, list: &dyn ListSink) -> FlowOutcome {
        let cfg = &self.shared.config;
        match self.handle.run(self.shared.operations.delete(&self.instancia)).await {
            Settled::Refused(e) => refused(e),
            Settled::Stale => discarded(&cfg.model),
            Settled::Done(Ok(())) => {
                tracing::info!(model = %cfg.model, id = self.instancia.id, "deleted");
                list.remove_item(self.instancia.id);
                self.shared.notifier.notify_success(&messages::deleted(cfg));
                FlowOutcome::Applied
            }
            Settled::Done(Err(e)) => {
                self.shared
                    .notifier
                    .notify_error(&messages::delete_failed(cfg, &e.user_message()));
                FlowOutcome::Rejected(e)
            }
        }
    }
}
