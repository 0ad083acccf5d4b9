//! In-memory implementation of the store contract: a JSON tree behind a
//! lock, with watchers notified on every mutation under their path.

use super::{Canceller, GameStore, Snapshot, Subscription};
use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::sync::RwLock;

struct Watcher {
    path: Vec<String>,
    tx: mpsc::UnboundedSender<Snapshot>,
}

struct Inner {
    root: RwLock<Value>,
    // Sync mutex so cancellation works from non-async contexts (Drop).
    watchers: Mutex<HashMap<u64, Watcher>>,
    next_watcher_id: AtomicU64,
}

/// A process-local store with the same observable behavior as the remote
/// one: last write wins per field, field-level patches leave siblings
/// alone, and subscribers get pushed the subtree they watch.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                root: RwLock::new(Value::Object(Map::new())),
                watchers: Mutex::new(HashMap::new()),
                next_watcher_id: AtomicU64::new(0),
            }),
        }
    }

    /// Notify every watcher whose subtree overlaps the mutated path.
    fn notify(&self, root: &Value, mutated: &[String]) {
        let mut watchers = self
            .inner
            .watchers
            .lock()
            .expect("watcher registry poisoned");
        watchers.retain(|_, watcher| {
            let overlaps = is_prefix(&watcher.path, mutated) || is_prefix(mutated, &watcher.path);
            if !overlaps {
                return true;
            }
            let snapshot = value_at(root, &watcher.path).cloned();
            // A failed send means the receiver is gone; drop the watcher.
            watcher.tx.send(snapshot).is_ok()
        });
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn write(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let segments = split_path(path);
        let mut root = self.inner.root.write().await;
        if value.is_null() {
            remove_at(&mut root, &segments);
        } else {
            set_at(&mut root, &segments, value);
        }
        self.notify(&root, &segments);
        Ok(())
    }

    async fn patch(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        let segments = split_path(path);
        let mut root = self.inner.root.write().await;

        match value_at(&root, &segments) {
            Some(existing) if !existing.is_object() => {
                return Err(StoreError::NotAnObject(path.to_string()));
            }
            Some(_) => {}
            None => set_at(&mut root, &segments, Value::Object(Map::new())),
        }

        if let Some(Value::Object(target)) = value_at_mut(&mut root, &segments) {
            for (key, value) in fields {
                if value.is_null() {
                    target.remove(&key);
                } else {
                    target.insert(key, value);
                }
            }
        }

        self.notify(&root, &segments);
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let segments = split_path(path);
        let root = self.inner.root.read().await;
        Ok(value_at(&root, &segments).cloned())
    }

    async fn subscribe(&self, path: &str) -> Result<Subscription, StoreError> {
        let segments = split_path(path);
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.inner.next_watcher_id.fetch_add(1, Ordering::Relaxed);

        // Initial delivery and registration happen under the same root
        // lock, so a concurrent write cannot land between them unseen.
        {
            let root = self.inner.root.read().await;
            let snapshot = value_at(&root, &segments).cloned();
            tx.send(snapshot)
                .map_err(|_| StoreError::Backend("subscriber gone before delivery".into()))?;
            self.inner
                .watchers
                .lock()
                .expect("watcher registry poisoned")
                .insert(
                    id,
                    Watcher {
                        path: segments,
                        tx,
                    },
                );
        }

        let inner = Arc::clone(&self.inner);
        let canceller = Canceller::new(move || {
            inner
                .watchers
                .lock()
                .expect("watcher registry poisoned")
                .remove(&id);
        });

        tracing::debug!(path, watcher = id, "subscribed");
        Ok(Subscription::new(rx, canceller))
    }
}

fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_prefix(prefix: &[String], path: &[String]) -> bool {
    prefix.len() <= path.len() && prefix.iter().zip(path).all(|(a, b)| a == b)
}

fn value_at<'a>(root: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = root;
    for segment in path {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn value_at_mut<'a>(root: &'a mut Value, path: &[String]) -> Option<&'a mut Value> {
    let mut current = root;
    for segment in path {
        current = current.as_object_mut()?.get_mut(segment)?;
    }
    Some(current)
}

/// Set `value` at `path`, creating (or overwriting) intermediate objects.
fn set_at(root: &mut Value, path: &[String], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        *root = value;
        return;
    };

    if !root.is_object() {
        *root = Value::Object(Map::new());
    }
    let map = root.as_object_mut().expect("just ensured object");
    let child = map.entry(first.clone()).or_insert(Value::Object(Map::new()));
    set_at(child, rest, value);
}

fn remove_at(root: &mut Value, path: &[String]) {
    let Some((first, rest)) = path.split_first() else {
        *root = Value::Object(Map::new());
        return;
    };

    let Some(map) = root.as_object_mut() else {
        return;
    };
    if rest.is_empty() {
        map.remove(first);
    } else if let Some(child) = map.get_mut(first) {
        remove_at(child, rest);
    }
}
