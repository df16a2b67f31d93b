//! Outbound effects of a flow: user notifications and list mutations.
//! The crate never owns the canonical list; it proposes mutations through `ListSink`.

use crate::entity::{Entity, EntityId};
use std::sync::{Arc, Mutex, PoisonError};

pub trait Notifier: Send + Sync {
    fn notify_success(&self, message: &str);
    fn notify_error(&self, message: &str);
}

pub trait ListSink: Send + Sync {
    fn add_item(&self, entity: Entity);
    /// Replace the entity with the same id.
    fn update_item(&self, entity: Entity);
    fn remove_item(&self, id: EntityId);
}

/// Emits notifications as log events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify_success(&self, message: &str) {
        tracing::info!(target: "resource_sdk::notify", "{}", message);
    }

    fn notify_error(&self, message: &str) {
        tracing::warn!(target: "resource_sdk::notify", "{}", message);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Error(String),
}

/// Keeps every notification, in order. Cloning shares the same log.
#[derive(Clone, Debug, Default)]
pub struct RecordingNotifier {
    log: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn last(&self) -> Option<Notification> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    fn push(&self, n: Notification) {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).push(n);
    }
}

impl Notifier for RecordingNotifier {
    fn notify_success(&self, message: &str) {
        self.push(Notification::Success(message.to_string()));
    }

    fn notify_error(&self, message: &str) {
        self.push(Notification::Error(message.to_string()));
    }
}

/// In-memory list as a table view would hold it. Cloning shares the same rows.
#[derive(Clone, Debug, Default)]
pub struct ResourceList {
    items: Arc<Mutex<Vec<Entity>>>,
}

impl ResourceList {
    pub fn new(items: Vec<Entity>) -> Self {
        Self {
            items: Arc::new(Mutex::new(items)),
        }
    }

    pub fn snapshot(&self) -> Vec<Entity> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn get(&self, id: EntityId) -> Option<Entity> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|e| e.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace every row, e.g. after a fresh list fetch.
    pub fn replace_all(&self, items: Vec<Entity>) {
        *self.items.lock().unwrap_or_else(PoisonError::into_inner) = items;
    }
}

impl ListSink for ResourceList {
    fn add_item(&self, entity: Entity) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entity);
    }

    fn update_item(&self, entity: Entity) {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        match items.iter_mut().find(|e| e.id == entity.id) {
            Some(slot) => *slot = entity,
            None => tracing::warn!(id = entity.id, "update for an entity not in the list"),
        }
    }

    fn remove_item(&self, id: EntityId) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|e| e.id != id);
    }
}
