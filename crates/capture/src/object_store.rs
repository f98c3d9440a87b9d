//! In-memory store of short-lived object references.
//!
//! Models the browser's object-URL mechanism: the engine publishes a
//! generated payload, hands out an opaque id, and revokes the id shortly
//! after. Anything holding the id must dereference it before revocation.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Opaque handle to a published payload.
pub type ObjectId = u64;

/// Thread-safe registry of published payloads.
#[derive(Debug, Default)]
pub struct ObjectStore {
    next_id: AtomicU64,
    objects: Mutex<HashMap<ObjectId, Arc<[u8]>>>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a payload and returns its id.
    pub fn publish(&self, bytes: Vec<u8>) -> ObjectId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.objects.lock().insert(id, Arc::from(bytes.into_boxed_slice()));
        id
    }

    /// Resolves an id to its payload, if not yet revoked.
    pub fn resolve(&self, id: ObjectId) -> Option<Arc<[u8]>> {
        self.objects.lock().get(&id).cloned()
    }

    /// Revokes an id; later resolutions fail.
    pub fn revoke(&self, id: ObjectId) {
        self.objects.lock().remove(&id);
    }

    /// Number of live (unrevoked) objects.
    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_resolve_revoke() {
        let store = ObjectStore::new();
        let id = store.publish(b"payload".to_vec());

        assert_eq!(store.resolve(id).as_deref(), Some(b"payload".as_slice()));
        store.revoke(id);
        assert_eq!(store.resolve(id), None);
        assert!(store.is_empty());
    }

    #[test]
    fn ids_are_unique() {
        let store = ObjectStore::new();
        let first = store.publish(b"a".to_vec());
        let second = store.publish(b"b".to_vec());
        assert_ne!(first, second);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn revoking_unknown_id_is_harmless() {
        let store = ObjectStore::new();
        store.revoke(42);
        assert!(store.is_empty());
    }
}
