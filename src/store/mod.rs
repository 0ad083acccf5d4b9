//! The shared game record store: an abstract, remotely-synchronized
//! key-value tree with field-level patch semantics and push-based
//! subscriptions. The production collaborator is a cloud realtime
//! database; [`MemoryStore`] is a drop-in local backend.

mod memory;

pub use memory::MemoryStore;

use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::mpsc;

/// The value at a subscribed path, or `None` when the path does not exist.
pub type Snapshot = Option<Value>;

/// Store primitives. Paths are `/`-separated, e.g. `games/ABC123/votes/Ann`.
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Overwrite the value at `path`. Writing `Value::Null` deletes it.
    async fn write(&self, path: &str, value: Value) -> Result<(), StoreError>;

    /// Merge `fields` into the object at `path` without touching sibling
    /// fields. A `Null` field value removes that field.
    async fn patch(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError>;

    /// One-shot read; `None` signals the path does not exist.
    async fn read(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Push-based change feed for the subtree at `path`. The current value
    /// is delivered once immediately, then again on every change.
    async fn subscribe(&self, path: &str) -> Result<Subscription, StoreError>;
}

/// Detaches a [`Subscription`] from its store. Cloneable so a listener task
/// can own the subscription while its creator keeps the means to stop it.
#[derive(Clone)]
pub struct Canceller(Arc<dyn Fn() + Send + Sync>);

impl Canceller {
    pub fn new(f: impl Fn() + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Stop delivery and release the store-side resource. Idempotent.
    pub fn cancel(&self) {
        (self.0)()
    }
}

/// A live change feed. Dropping it (or calling [`Subscription::cancel`])
/// detaches it from the store.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<Snapshot>,
    canceller: Canceller,
}

impl Subscription {
    pub fn new(rx: mpsc::UnboundedReceiver<Snapshot>, canceller: Canceller) -> Self {
        Self { rx, canceller }
    }

    /// Next snapshot, or `None` once the subscription is cancelled.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.rx.recv().await
    }

    /// A handle that cancels this subscription from elsewhere.
    pub fn canceller(&self) -> Canceller {
        self.canceller.clone()
    }

    pub fn cancel(&mut self) {
        self.canceller.cancel();
        self.rx.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.canceller.cancel();
    }
}

/// Path helpers for the game record tree.
pub mod paths {
    pub fn game(code: &str) -> String {
        format!("games/{code}")
    }

    pub fn player(code: &str, name: &str) -> String {
        format!("games/{code}/players/{name}")
    }

    pub fn answer(code: &str, key: &str) -> String {
        format!("games/{code}/answers/{key}")
    }

    pub fn vote(code: &str, name: &str) -> String {
        format!("games/{code}/votes/{name}")
    }

    pub fn guess_count(code: &str, name: &str) -> String {
        format!("games/{code}/playerGuessCount/{name}")
    }
}
