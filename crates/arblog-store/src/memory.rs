use std::collections::HashMap;
use std::sync::RwLock;

use arblog_types::ObjectId;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ObjectStore;

/// In-memory, HashMap-based object store.
///
/// Shared by every archive of a local network so that forks deduplicate
/// against their source. Objects are cloned on read/write.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, StoredObject>>,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns `true` if nothing has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bytes across all stored objects.
    pub fn total_bytes(&self) -> u64 {
        self.objects
            .read()
            .map(|m| m.values().map(|obj| obj.size).sum())
            .unwrap_or(0)
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let map = self.objects.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(id).cloned())
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        if id.is_null() {
            return Err(StoreError::NullObjectId);
        }
        let mut map = self.objects.write().map_err(|_| StoreError::Poisoned)?;
        map.entry(id).or_insert_with(|| {
            debug!(id = %id.short_hex(), kind = %object.kind, size = object.size, "stored object");
            object.clone()
        });
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        let map = self.objects.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.contains_key(id))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Blob, Tree, TreeEntry};

    fn blob(content: &[u8]) -> StoredObject {
        Blob::new(content.to_vec()).to_stored_object()
    }

    #[test]
    fn write_and_read_blob() {
        let store = InMemoryObjectStore::new();
        let obj = blob(b"This is my first post.");
        let id = store.write(&obj).unwrap();
        assert_eq!(store.read(&id).unwrap(), Some(obj));
    }

    #[test]
    fn write_and_read_tree() {
        let store = InMemoryObjectStore::new();
        let blob_id = store.write(&blob(b"body")).unwrap();
        let tree = Tree::new(vec![TreeEntry::file("hello.md", blob_id, 5, 5)]);
        let id = store.write(&tree.to_stored_object().unwrap()).unwrap();

        let decoded = Tree::from_stored_object(&store.require(&id).unwrap()).unwrap();
        assert_eq!(decoded.get("hello.md").unwrap().object_id, blob_id);
    }

    #[test]
    fn identical_content_is_stored_once() {
        let store = InMemoryObjectStore::new();
        let a = store.write(&blob(b"shared")).unwrap();
        let b = store.write(&blob(b"shared")).unwrap();
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn missing_object() {
        let store = InMemoryObjectStore::new();
        let id = ObjectId::from_bytes(b"nope");
        assert!(store.read(&id).unwrap().is_none());
        assert!(!store.exists(&id).unwrap());
        assert!(matches!(store.require(&id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn total_bytes_and_len() {
        let store = InMemoryObjectStore::default();
        assert!(store.is_empty());
        store.write(&blob(b"12345")).unwrap();
        store.write(&blob(b"123456789")).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.total_bytes(), 14);
    }

    #[test]
    fn concurrent_reads_are_safe() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryObjectStore::new());
        let id = store.write(&blob(b"shared data")).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let obj = store.read(&id).unwrap().unwrap();
                    assert_eq!(obj.compute_id(), id);
                })
            })
            .collect();
        for h in handles {
            h.join().expect("thread should not panic");
        }
    }

    #[test]
    fn debug_format() {
        let store = InMemoryObjectStore::new();
        store.write(&blob(b"x")).unwrap();
        assert!(format!("{store:?}").contains("object_count"));
    }
}
