//! The session document store boundary.
//!
//! Sessions live in a shared, mutable, single-document key-value store
//! with change notification: best-effort, last-write-wins per field,
//! eventually delivering snapshots to subscribers. The trait below is
//! the full surface the game core needs; anything implementing it — a
//! realtime database client, the in-process [`MemoryStore`] — can carry
//! a session.
//!
//! [`MemoryStore`]: super::memory::MemoryStore

use serde_json::Value;
use thiserror::Error;

use super::patch::DocPatch;

/// Store failure classes.
///
/// Both variants are recoverable at the session level: the caller may
/// retry the originating action or leave and recreate the session.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not serve the request.
    #[error("document store unavailable: {0}")]
    Unavailable(String),

    /// A document was present but did not decode against the schema.
    #[error("malformed session document: {0}")]
    Corrupt(String),

    /// `create` found a document already at the path.
    #[error("document already exists")]
    AlreadyExists,
}

/// Snapshot callback: `Some` with the latest document, `None` once the
/// document no longer exists.
///
/// Callbacks run on the mutating caller's stack and must not call back
/// into the store; hand the snapshot to a channel and return.
pub type SnapshotCallback = Box<dyn FnMut(Option<&Value>) + Send>;

/// Action the store applies on behalf of a client that disconnects
/// without leaving cleanly. This is the only disconnect-detection
/// mechanism; there is no heartbeat polling.
#[derive(Clone, Debug)]
pub enum DisconnectAction {
    /// Delete the whole document.
    DeleteDocument,
    /// Set a field (slash-separated path) to a value.
    SetField(String, Value),
    /// Remove a field.
    RemoveField(String),
}

/// Live subscription to a document. Dropping it unsubscribes.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap a cancellation closure.
    #[must_use]
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self { cancel: Some(Box::new(cancel)) }
    }

    /// Unsubscribe now rather than on drop.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// One party's connection to the shared document store.
pub trait SessionStore: Send {
    /// Write a fresh document at `code`. Fails with
    /// [`StoreError::AlreadyExists`] if one is present.
    fn create(&self, code: &str, doc: Value) -> Result<(), StoreError>;

    /// Read the document at `code`, `None` if absent.
    fn read(&self, code: &str) -> Result<Option<Value>, StoreError>;

    /// Merge a partial update into the document (per-field replace,
    /// not whole-document replace).
    fn update(&self, code: &str, patch: DocPatch) -> Result<(), StoreError>;

    /// Delete the document. Deleting an absent document is not an
    /// error.
    fn delete(&self, code: &str) -> Result<(), StoreError>;

    /// Observe the document. The callback fires immediately with the
    /// current state, then on every change, and with `None` when the
    /// document is deleted.
    fn subscribe(&self, code: &str, callback: SnapshotCallback) -> Result<Subscription, StoreError>;

    /// Arm actions the store applies if this connection drops
    /// ungracefully. Re-arming replaces any previous actions for this
    /// connection and document.
    fn arm_on_disconnect(
        &self,
        code: &str,
        actions: Vec<DisconnectAction>,
    ) -> Result<(), StoreError>;
}
