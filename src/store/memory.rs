//! In-process reference implementation of the store boundary.
//!
//! One [`MemoryStore`] backs any number of [`MemoryClient`] connections
//! (one per party in tests). Mutations notify subscribers synchronously
//! on the mutating caller's stack, which models the store's
//! at-least-eventual delivery with the tightest possible timing.
//!
//! `drop_connection` simulates an ungraceful disconnect: it applies the
//! connection's armed actions and tears down its subscriptions, letting
//! tests exercise the presence protocol without a network.

use log::debug;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::patch::DocPatch;
use super::store::{
    DisconnectAction, SessionStore, SnapshotCallback, StoreError, Subscription,
};

type ClientId = u64;
type SubId = u64;

struct SubEntry {
    id: SubId,
    client: ClientId,
    code: String,
    callback: SnapshotCallback,
}

struct ArmedEntry {
    client: ClientId,
    code: String,
    actions: Vec<DisconnectAction>,
}

#[derive(Default)]
struct Inner {
    docs: HashMap<String, Value>,
    subs: Vec<SubEntry>,
    armed: Vec<ArmedEntry>,
    next_client: ClientId,
    next_sub: SubId,
}

impl Inner {
    /// Invoke every subscriber of `code` with the current snapshot.
    fn notify(&mut self, code: &str) {
        let snapshot = self.docs.get(code).cloned();
        for sub in self.subs.iter_mut().filter(|s| s.code == code) {
            (sub.callback)(snapshot.as_ref());
        }
    }
}

/// Shared in-memory document store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new connection.
    #[must_use]
    pub fn client(&self) -> MemoryClient {
        let mut inner = self.inner.lock().expect("store lock");
        let id = inner.next_client;
        inner.next_client += 1;
        MemoryClient { inner: Arc::clone(&self.inner), id }
    }

    /// Number of documents currently stored.
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.inner.lock().expect("store lock").docs.len()
    }
}

/// One connection to a [`MemoryStore`].
///
/// Clones share the connection identity, so a test can keep a handle
/// for [`drop_connection`] after handing the original to a session.
///
/// [`drop_connection`]: MemoryClient::drop_connection
#[derive(Clone)]
pub struct MemoryClient {
    inner: Arc<Mutex<Inner>>,
    id: ClientId,
}

impl MemoryClient {
    /// Simulate an ungraceful disconnect of this connection: apply its
    /// armed actions in order and drop its subscriptions.
    pub fn drop_connection(&self) {
        let mut inner = self.inner.lock().expect("store lock");

        inner.subs.retain(|s| s.client != self.id);

        let armed: Vec<ArmedEntry> = {
            let mut taken = Vec::new();
            let mut kept = Vec::new();
            for entry in inner.armed.drain(..) {
                if entry.client == self.id {
                    taken.push(entry);
                } else {
                    kept.push(entry);
                }
            }
            inner.armed = kept;
            taken
        };

        for entry in armed {
            debug!("disconnect actions firing for document {}", entry.code);
            for action in entry.actions {
                match action {
                    DisconnectAction::DeleteDocument => {
                        inner.docs.remove(&entry.code);
                    }
                    DisconnectAction::SetField(path, value) => {
                        if let Some(doc) = inner.docs.get_mut(&entry.code) {
                            DocPatch::new().set(path, value).apply(doc);
                        }
                    }
                    DisconnectAction::RemoveField(path) => {
                        if let Some(doc) = inner.docs.get_mut(&entry.code) {
                            DocPatch::new().remove(path).apply(doc);
                        }
                    }
                }
            }
            inner.notify(&entry.code);
        }
    }
}

impl SessionStore for MemoryClient {
    fn create(&self, code: &str, doc: Value) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store lock");
        if inner.docs.contains_key(code) {
            return Err(StoreError::AlreadyExists);
        }
        inner.docs.insert(code.to_string(), doc);
        inner.notify(code);
        Ok(())
    }

    fn read(&self, code: &str) -> Result<Option<Value>, StoreError> {
        let inner = self.inner.lock().expect("store lock");
        Ok(inner.docs.get(code).cloned())
    }

    fn update(&self, code: &str, patch: DocPatch) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store lock");
        let doc = inner
            .docs
            .get_mut(code)
            .ok_or_else(|| StoreError::Unavailable(format!("no document at {code}")))?;
        patch.apply(doc);
        inner.notify(code);
        Ok(())
    }

    fn delete(&self, code: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store lock");
        if inner.docs.remove(code).is_some() {
            inner.notify(code);
        }
        Ok(())
    }

    fn subscribe(&self, code: &str, mut callback: SnapshotCallback) -> Result<Subscription, StoreError> {
        let mut inner = self.inner.lock().expect("store lock");

        callback(inner.docs.get(code).map(|d| d as &Value));

        let sub_id = inner.next_sub;
        inner.next_sub += 1;
        inner.subs.push(SubEntry {
            id: sub_id,
            client: self.id,
            code: code.to_string(),
            callback,
        });

        let handle = Arc::clone(&self.inner);
        Ok(Subscription::new(move || {
            handle.lock().expect("store lock").subs.retain(|s| s.id != sub_id);
        }))
    }

    fn arm_on_disconnect(
        &self,
        code: &str,
        actions: Vec<DisconnectAction>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store lock");
        inner.armed.retain(|e| !(e.client == self.id && e.code == code));
        inner.armed.push(ArmedEntry {
            client: self.id,
            code: code.to_string(),
            actions,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::mpsc;

    #[test]
    fn test_create_then_read() {
        let store = MemoryStore::new();
        let client = store.client();

        client.create("12345", json!({"status": "waiting"})).unwrap();

        let doc = client.read("12345").unwrap().unwrap();
        assert_eq!(doc["status"], "waiting");
        assert!(client.read("99999").unwrap().is_none());
    }

    #[test]
    fn test_create_collision() {
        let store = MemoryStore::new();
        let client = store.client();

        client.create("12345", json!({})).unwrap();
        assert!(matches!(
            client.create("12345", json!({})),
            Err(StoreError::AlreadyExists)
        ));
    }

    #[test]
    fn test_update_merges_fields() {
        let store = MemoryStore::new();
        let client = store.client();
        client.create("12345", json!({"status": "waiting", "scores": 0})).unwrap();

        client.update("12345", DocPatch::new().set("status", "playing")).unwrap();

        let doc = client.read("12345").unwrap().unwrap();
        assert_eq!(doc["status"], "playing");
        assert_eq!(doc["scores"], 0);
    }

    #[test]
    fn test_update_missing_document_fails() {
        let store = MemoryStore::new();
        let client = store.client();

        assert!(matches!(
            client.update("00000", DocPatch::new().set("x", 1)),
            Err(StoreError::Unavailable(_))
        ));
    }

    #[test]
    fn test_subscribe_fires_immediately_and_on_change() {
        let store = MemoryStore::new();
        let writer = store.client();
        let reader = store.client();
        writer.create("12345", json!({"n": 0})).unwrap();

        let (tx, rx) = mpsc::channel();
        let _sub = reader
            .subscribe(
                "12345",
                Box::new(move |doc| {
                    let _ = tx.send(doc.map(|d| d["n"].as_i64().unwrap()));
                }),
            )
            .unwrap();

        writer.update("12345", DocPatch::new().set("n", 1)).unwrap();
        writer.delete("12345").unwrap();

        assert_eq!(rx.try_recv(), Ok(Some(0)));
        assert_eq!(rx.try_recv(), Ok(Some(1)));
        assert_eq!(rx.try_recv(), Ok(None));
    }

    #[test]
    fn test_unsubscribe_on_drop() {
        let store = MemoryStore::new();
        let writer = store.client();
        let reader = store.client();
        writer.create("12345", json!({"n": 0})).unwrap();

        let (tx, rx) = mpsc::channel();
        let sub = reader
            .subscribe("12345", Box::new(move |_| {
                let _ = tx.send(());
            }))
            .unwrap();

        drop(sub);
        writer.update("12345", DocPatch::new().set("n", 1)).unwrap();

        assert_eq!(rx.try_recv(), Ok(())); // initial snapshot only
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_disconnect_applies_armed_actions() {
        let store = MemoryStore::new();
        let host = store.client();
        let guest = store.client();
        host.create("12345", json!({"guest": {"id": "g"}, "status": "ready"})).unwrap();

        guest
            .arm_on_disconnect(
                "12345",
                vec![
                    DisconnectAction::RemoveField("guest".into()),
                    DisconnectAction::SetField("status".into(), json!("waiting")),
                ],
            )
            .unwrap();

        guest.drop_connection();

        let doc = host.read("12345").unwrap().unwrap();
        assert!(doc.get("guest").is_none());
        assert_eq!(doc["status"], "waiting");
    }

    #[test]
    fn test_disconnect_delete_document() {
        let store = MemoryStore::new();
        let host = store.client();
        host.create("12345", json!({})).unwrap();
        host.arm_on_disconnect("12345", vec![DisconnectAction::DeleteDocument]).unwrap();

        host.drop_connection();

        assert_eq!(store.document_count(), 0);
    }

    #[test]
    fn test_rearm_replaces_actions() {
        let store = MemoryStore::new();
        let client = store.client();
        client.create("12345", json!({"a": 1})).unwrap();

        client
            .arm_on_disconnect("12345", vec![DisconnectAction::DeleteDocument])
            .unwrap();
        client
            .arm_on_disconnect("12345", vec![DisconnectAction::SetField("a".into(), json!(2))])
            .unwrap();

        client.drop_connection();

        let host = store.client();
        assert_eq!(host.read("12345").unwrap().unwrap()["a"], 2);
    }
}
