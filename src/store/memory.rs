//! In-memory document store with the same delivery semantics as the remote
//! one: snapshots are pushed to subscribers synchronously after every
//! mutation, filters are evaluated per watcher, and cancellation stops
//! delivery immediately — including for a dispatch already in flight.

use std::cell::{Cell, RefCell};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::rc::{Rc, Weak};

use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;

use super::{CollectionRef, Document, DocumentStore, SnapshotHandler, Subscription};

struct Watcher {
    id: u64,
    query: CollectionRef,
    handler: SnapshotHandler,
    /// Cleared on cancel so a watcher removed mid-dispatch is never invoked.
    active: Rc<Cell<bool>>,
}

#[derive(Default)]
struct Inner {
    /// path -> document id -> fields
    collections: HashMap<String, BTreeMap<String, Value>>,
    watchers: Vec<Watcher>,
    next_watcher: u64,
}

/// Single-threaded in-memory `DocumentStore`.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a document under a caller-chosen id (the auth provider's
    /// `users/{uid}` write). Not part of the adapter trait; the dashboard
    /// itself only ever adds with store-assigned ids.
    pub fn upsert(&self, collection: &CollectionRef, id: &str, data: Value) {
        {
            let mut inner = self.inner.borrow_mut();
            let docs = inner.collections.entry(collection.path().to_string()).or_default();
            match docs.entry(id.to_string()) {
                Entry::Occupied(mut existing) => merge_fields(existing.get_mut(), data),
                Entry::Vacant(slot) => {
                    slot.insert(data);
                }
            }
        }
        self.notify(collection.path());
    }

    fn snapshot(inner: &Inner, query: &CollectionRef) -> Vec<Document> {
        inner
            .collections
            .get(query.path())
            .map(|docs| {
                docs.iter()
                    .filter(|(_, data)| query.matches(data))
                    .map(|(id, data)| Document {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Deliver fresh snapshots to every live watcher of `path`. No borrow is
    /// held while handlers run, so handlers may subscribe or mutate freely.
    fn notify(&self, path: &str) {
        let pending: Vec<(SnapshotHandler, Rc<Cell<bool>>, Vec<Document>)> = {
            let inner = self.inner.borrow();
            inner
                .watchers
                .iter()
                .filter(|w| w.query.path() == path && w.active.get())
                .map(|w| {
                    (
                        w.handler.clone(),
                        w.active.clone(),
                        Self::snapshot(&inner, &w.query),
                    )
                })
                .collect()
        };
        for (handler, active, snapshot) in pending {
            if active.get() {
                handler(&snapshot);
            }
        }
    }
}

/// Shallow-merge patch fields into a document.
fn merge_fields(target: &mut Value, patch: Value) {
    if let (Value::Object(target), Value::Object(patch)) = (target, patch) {
        for (key, value) in patch {
            target.insert(key, value);
        }
    }
}

impl DocumentStore for MemoryStore {
    fn subscribe(&self, query: CollectionRef, handler: SnapshotHandler) -> Subscription {
        let active = Rc::new(Cell::new(true));
        let (id, snapshot) = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_watcher;
            inner.next_watcher += 1;
            inner.watchers.push(Watcher {
                id,
                query: query.clone(),
                handler: handler.clone(),
                active: active.clone(),
            });
            (id, Self::snapshot(&inner, &query))
        };
        debug!(path = query.path(), watcher = id, "subscribed");
        // Initial delivery, after the registration borrow is released.
        handler(&snapshot);

        let weak: Weak<RefCell<Inner>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            active.set(false);
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().watchers.retain(|w| w.id != id);
            }
        })
    }

    fn add(&self, collection: &CollectionRef, data: Value) -> Result<String, StoreError> {
        let mut data = match data {
            Value::Object(map) => map,
            _ => return Err(StoreError::Backend("document must be a JSON object".to_string())),
        };
        let id = Uuid::new_v4().simple().to_string();
        // Write the assigned id back onto the document so it is self-describing.
        data.insert("id".to_string(), Value::String(id.clone()));
        {
            let mut inner = self.inner.borrow_mut();
            inner
                .collections
                .entry(collection.path().to_string())
                .or_default()
                .insert(id.clone(), Value::Object(data));
        }
        self.notify(collection.path());
        Ok(id)
    }

    fn update(&self, collection: &CollectionRef, id: &str, patch: Value) -> Result<(), StoreError> {
        {
            let mut inner = self.inner.borrow_mut();
            let doc = inner
                .collections
                .get_mut(collection.path())
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| StoreError::NotFound(format!("{}/{id}", collection.path())))?;
            merge_fields(doc, patch);
        }
        self.notify(collection.path());
        Ok(())
    }

    fn delete(&self, collection: &CollectionRef, id: &str) -> Result<(), StoreError> {
        let removed = {
            let mut inner = self.inner.borrow_mut();
            inner
                .collections
                .get_mut(collection.path())
                .map(|docs| docs.remove(id).is_some())
                .unwrap_or(false)
        };
        if removed {
            self.notify(collection.path());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collect_titles(snapshot: &[Document]) -> Vec<String> {
        snapshot
            .iter()
            .filter_map(|d| d.data.get("title").and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn subscribe_delivers_immediately_and_on_change() {
        let store = MemoryStore::new();
        let seen: Rc<RefCell<Vec<usize>>> = Rc::default();
        let seen_in = seen.clone();
        let _sub = store.subscribe(
            CollectionRef::projects(),
            Rc::new(move |snap: &[Document]| seen_in.borrow_mut().push(snap.len())),
        );
        store
            .add(&CollectionRef::projects(), json!({"name": "Alpha"}))
            .unwrap();
        assert_eq!(*seen.borrow(), vec![0, 1]);
    }

    #[test]
    fn filtered_subscription_only_sees_matching_documents() {
        let store = MemoryStore::new();
        let seen: Rc<RefCell<Vec<Vec<String>>>> = Rc::default();
        let seen_in = seen.clone();
        let _sub = store.subscribe(
            CollectionRef::tasks_for("p1"),
            Rc::new(move |snap: &[Document]| seen_in.borrow_mut().push(collect_titles(snap))),
        );
        store
            .add(&CollectionRef::tasks(), json!({"projectId": "p1", "title": "mine"}))
            .unwrap();
        store
            .add(&CollectionRef::tasks(), json!({"projectId": "p2", "title": "other"}))
            .unwrap();
        let last = seen.borrow().last().cloned().unwrap();
        assert_eq!(last, vec!["mine".to_string()]);
    }

    #[test]
    fn add_writes_the_id_back_onto_the_document() {
        let store = MemoryStore::new();
        let id = store
            .add(&CollectionRef::projects(), json!({"name": "Alpha"}))
            .unwrap();
        let seen: Rc<RefCell<Vec<Document>>> = Rc::default();
        let seen_in = seen.clone();
        let _sub = store.subscribe(
            CollectionRef::projects(),
            Rc::new(move |snap: &[Document]| *seen_in.borrow_mut() = snap.to_vec()),
        );
        let docs = seen.borrow();
        assert_eq!(docs[0].data.get("id").and_then(Value::as_str), Some(id.as_str()));
    }

    #[test]
    fn cancelled_subscription_stops_delivery() {
        let store = MemoryStore::new();
        let seen: Rc<RefCell<Vec<usize>>> = Rc::default();
        let seen_in = seen.clone();
        let sub = store.subscribe(
            CollectionRef::projects(),
            Rc::new(move |snap: &[Document]| seen_in.borrow_mut().push(snap.len())),
        );
        sub.unsubscribe();
        store
            .add(&CollectionRef::projects(), json!({"name": "Alpha"}))
            .unwrap();
        assert_eq!(*seen.borrow(), vec![0]);
    }

    #[test]
    fn update_missing_document_is_an_error_but_delete_is_not() {
        let store = MemoryStore::new();
        let err = store
            .update(&CollectionRef::projects(), "nope", json!({"name": "x"}))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert!(store.delete(&CollectionRef::projects(), "nope").is_ok());
    }

    #[test]
    fn update_merges_shallowly() {
        let store = MemoryStore::new();
        let id = store
            .add(&CollectionRef::projects(), json!({"name": "Alpha", "progress": 0}))
            .unwrap();
        store
            .update(&CollectionRef::projects(), &id, json!({"progress": 50}))
            .unwrap();
        let seen: Rc<RefCell<Vec<Document>>> = Rc::default();
        let seen_in = seen.clone();
        let _sub = store.subscribe(
            CollectionRef::projects(),
            Rc::new(move |snap: &[Document]| *seen_in.borrow_mut() = snap.to_vec()),
        );
        let docs = seen.borrow();
        assert_eq!(docs[0].data.get("name").and_then(Value::as_str), Some("Alpha"));
        assert_eq!(docs[0].data.get("progress").and_then(Value::as_u64), Some(50));
    }
}
