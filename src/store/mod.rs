//! Document-store adapter: live collection subscriptions plus
//! add/update/delete, keyed by collection path.
//!
//! The store is an external collaborator; this module defines the surface
//! the client consumes and an in-memory implementation with the same
//! delivery semantics, used by tests and local runs.

pub mod auth;
pub mod memory;
pub mod session;
pub mod user_cache;

use std::fmt;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::error::StoreError;

pub use auth::{AuthProvider, AuthStateHandler, AuthUser, MemoryAuth};
pub use memory::MemoryStore;
pub use session::Session;
pub use user_cache::UserCache;

/// One document of a snapshot: the store-assigned id plus the raw fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    /// Decode the document into a typed record, injecting the document id
    /// under the `id` field the way the live queries deliver it.
    ///
    /// A document that fails to decode is logged and skipped, never an error.
    pub fn decode<T: DeserializeOwned>(&self) -> Option<T> {
        let mut data = self.data.clone();
        if let Value::Object(map) = &mut data {
            map.insert("id".to_string(), Value::String(self.id.clone()));
        }
        match serde_json::from_value(data) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(id = %self.id, %err, "skipping malformed document");
                None
            }
        }
    }
}

/// A collection path plus an optional field-equality filter — the only query
/// shape the system uses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionRef {
    path: String,
    filter: Option<(String, String)>,
}

impl CollectionRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            filter: None,
        }
    }

    pub fn filtered(path: impl Into<String>, field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            filter: Some((field.into(), value.into())),
        }
    }

    // --- The collections the dashboard talks to ---

    pub fn projects() -> Self {
        Self::new("projects")
    }

    pub fn tasks() -> Self {
        Self::new("tasks")
    }

    /// Tasks of one project, filtered by `projectId` equality.
    pub fn tasks_for(project_id: &str) -> Self {
        Self::filtered("tasks", "projectId", project_id)
    }

    pub fn big_projects() -> Self {
        Self::new("bigProjectsTest")
    }

    pub fn sub_projects(big_project_id: &str) -> Self {
        Self::new(format!("bigProjectsTest/{big_project_id}/subProjects"))
    }

    pub fn sub_tasks(big_project_id: &str, sub_project_id: &str) -> Self {
        Self::new(format!(
            "bigProjectsTest/{big_project_id}/subProjects/{sub_project_id}/subTasks"
        ))
    }

    pub fn task_comments() -> Self {
        Self::new("taskComments")
    }

    /// Comments of one task, filtered by `taskId` equality.
    pub fn task_comments_for(task_id: &str) -> Self {
        Self::filtered("taskComments", "taskId", task_id)
    }

    pub fn users() -> Self {
        Self::new("users")
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn filter(&self) -> Option<(&str, &str)> {
        self.filter.as_ref().map(|(f, v)| (f.as_str(), v.as_str()))
    }

    /// Whether a document's fields pass this query's filter.
    pub fn matches(&self, data: &Value) -> bool {
        match &self.filter {
            None => true,
            Some((field, value)) => data
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|v| v == value),
        }
    }
}

/// Callback invoked with the full current result set of a live query, once
/// immediately on subscribe and again after every relevant change.
pub type SnapshotHandler = Rc<dyn Fn(&[Document])>;

/// The persistence surface the client consumes.
pub trait DocumentStore {
    /// Open a live query. The handler fires with the current snapshot before
    /// this call returns, then at least once per change to the collection.
    fn subscribe(&self, query: CollectionRef, handler: SnapshotHandler) -> Subscription;

    /// Create a document. The store assigns an id, writes it back onto the
    /// document (`id` field) so it is self-describing, and returns it.
    fn add(&self, collection: &CollectionRef, data: Value) -> Result<String, StoreError>;

    /// Shallow-merge the patch fields into an existing document.
    fn update(&self, collection: &CollectionRef, id: &str, patch: Value) -> Result<(), StoreError>;

    /// Delete a document. Deleting an id that no longer exists is a no-op.
    fn delete(&self, collection: &CollectionRef, id: &str) -> Result<(), StoreError>;
}

/// Handle for a live query; cancels delivery when dropped.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Cancel explicitly; equivalent to dropping the handle.
    pub fn unsubscribe(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
