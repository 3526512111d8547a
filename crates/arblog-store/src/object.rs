use arblog_crypto::{ContentHasher, Signature, SigningKey, VerifyingKey};
use arblog_types::{ArchiveAddress, ObjectId};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// File contents.
    Blob,
    /// Directory listing.
    Tree,
    /// Signed version record.
    Commit,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blob => write!(f, "blob"),
            Self::Tree => write!(f, "tree"),
            Self::Commit => write!(f, "commit"),
        }
    }
}

/// A stored object: kind tag + serialized data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub kind: ObjectKind,
    pub data: Vec<u8>,
    pub size: u64,
}

impl StoredObject {
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self { kind, data, size }
    }

    /// Compute the content-addressed ID using the hasher for this kind.
    pub fn compute_id(&self) -> ObjectId {
        let hasher = match self.kind {
            ObjectKind::Blob => &ContentHasher::BLOB,
            ObjectKind::Tree => &ContentHasher::TREE,
            ObjectKind::Commit => &ContentHasher::COMMIT,
        };
        hasher.hash(&self.data)
    }

    fn expect_kind(&self, kind: ObjectKind) -> StoreResult<()> {
        if self.kind != kind {
            return Err(StoreError::CorruptObject {
                id: self.compute_id(),
                reason: format!("expected {kind}, got {}", self.kind),
            });
        }
        Ok(())
    }

    fn decode_json<T: serde::de::DeserializeOwned>(&self, kind: ObjectKind) -> StoreResult<T> {
        self.expect_kind(kind)?;
        serde_json::from_slice(&self.data).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

fn encode_json<T: Serialize>(kind: ObjectKind, value: &T) -> StoreResult<StoredObject> {
    let data = serde_json::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(StoredObject::new(kind, data))
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// File contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Blob, self.data.clone())
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Blob)?;
        Ok(Self {
            data: obj.data.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// Whether a tree entry is a file or a subdirectory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryMode {
    File,
    Directory,
}

/// A single named entry in a directory listing.
///
/// Timestamps travel with the entry so that a checkout of a committed
/// version reproduces the original creation times.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub mode: EntryMode,
    pub name: String,
    pub object_id: ObjectId,
    /// Creation time, milliseconds since the UNIX epoch.
    pub ctime_ms: i64,
    /// Last modification time, milliseconds since the UNIX epoch.
    pub mtime_ms: i64,
}

impl TreeEntry {
    pub fn file(name: impl Into<String>, object_id: ObjectId, ctime_ms: i64, mtime_ms: i64) -> Self {
        Self {
            mode: EntryMode::File,
            name: name.into(),
            object_id,
            ctime_ms,
            mtime_ms,
        }
    }

    pub fn directory(name: impl Into<String>, object_id: ObjectId, ctime_ms: i64) -> Self {
        Self {
            mode: EntryMode::Directory,
            name: name.into(),
            object_id,
            ctime_ms,
            mtime_ms: ctime_ms,
        }
    }
}

/// Directory listing; entries are kept sorted by name for deterministic hashing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Self { entries }
    }

    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        encode_json(ObjectKind::Tree, self)
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.decode_json(ObjectKind::Tree)
    }

    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// CommitObject
// ---------------------------------------------------------------------------

/// A signed, published version of an archive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitObject {
    pub archive: ArchiveAddress,
    /// Monotonic version number, starting at 1.
    pub version: u64,
    /// The previous commit of this archive. For the first commit of a fork
    /// this is the source archive's head.
    pub parent: Option<ObjectId>,
    /// Root directory tree.
    pub root: ObjectId,
    pub timestamp_ms: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
}

impl CommitObject {
    /// Bytes covered by the signature (the record with no signature attached).
    pub fn signing_bytes(&self) -> StoreResult<Vec<u8>> {
        let unsigned = Self {
            signature: None,
            ..self.clone()
        };
        serde_json::to_vec(&unsigned).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    pub fn sign(mut self, key: &SigningKey) -> StoreResult<Self> {
        let bytes = self.signing_bytes()?;
        self.signature = Some(key.sign(&bytes));
        Ok(self)
    }

    /// Check the signature against the archive's own address.
    pub fn verify(&self) -> bool {
        let Some(signature) = &self.signature else {
            return false;
        };
        let Ok(key) = VerifyingKey::from_address(&self.archive) else {
            return false;
        };
        match self.signing_bytes() {
            Ok(bytes) => key.verify(&bytes, signature).is_ok(),
            Err(_) => false,
        }
    }

    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        encode_json(ObjectKind::Commit, self)
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.decode_json(ObjectKind::Commit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_roundtrip() {
        let blob = Blob::new(b"title: Hello".to_vec());
        let decoded = Blob::from_stored_object(&blob.to_stored_object()).unwrap();
        assert_eq!(blob, decoded);
    }

    #[test]
    fn blob_kind_mismatch() {
        let stored = StoredObject::new(ObjectKind::Tree, b"{}".to_vec());
        let err = Blob::from_stored_object(&stored).unwrap_err();
        assert!(matches!(err, StoreError::CorruptObject { .. }));
    }

    #[test]
    fn tree_entries_sorted() {
        let tree = Tree::new(vec![
            TreeEntry::file("style.css", ObjectId::null(), 0, 0),
            TreeEntry::directory("articles", ObjectId::null(), 0),
            TreeEntry::file("blog.json", ObjectId::null(), 0, 0),
        ]);
        let names: Vec<_> = tree.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["articles", "blog.json", "style.css"]);
        assert_eq!(tree.get("articles").unwrap().mode, EntryMode::Directory);
        assert!(tree.get("missing").is_none());
    }

    #[test]
    fn tree_hash_independent_of_insertion_order() {
        let a = Tree::new(vec![
            TreeEntry::file("a.md", ObjectId::null(), 1, 1),
            TreeEntry::file("b.md", ObjectId::null(), 2, 2),
        ]);
        let b = Tree::new(vec![
            TreeEntry::file("b.md", ObjectId::null(), 2, 2),
            TreeEntry::file("a.md", ObjectId::null(), 1, 1),
        ]);
        assert_eq!(
            a.to_stored_object().unwrap().compute_id(),
            b.to_stored_object().unwrap().compute_id()
        );
    }

    #[test]
    fn empty_tree() {
        assert!(Tree::empty().is_empty());
        assert_eq!(Tree::empty().len(), 0);
    }

    #[test]
    fn different_kinds_produce_different_ids() {
        let data = b"same data".to_vec();
        let blob = StoredObject::new(ObjectKind::Blob, data.clone());
        let tree = StoredObject::new(ObjectKind::Tree, data);
        assert_ne!(blob.compute_id(), tree.compute_id());
    }

    #[test]
    fn signed_commit_verifies() {
        let key = SigningKey::generate();
        let commit = CommitObject {
            archive: key.address(),
            version: 1,
            parent: None,
            root: ObjectId::from_bytes(b"root"),
            timestamp_ms: 1_000,
            signature: None,
        };
        assert!(!commit.verify());
        let signed = commit.sign(&key).unwrap();
        assert!(signed.verify());

        let stored = signed.to_stored_object().unwrap();
        let decoded = CommitObject::from_stored_object(&stored).unwrap();
        assert!(decoded.verify());
    }

    #[test]
    fn commit_signed_by_foreign_key_fails() {
        let owner = SigningKey::generate();
        let intruder = SigningKey::generate();
        let commit = CommitObject {
            archive: owner.address(),
            version: 2,
            parent: None,
            root: ObjectId::null(),
            timestamp_ms: 0,
            signature: None,
        }
        .sign(&intruder)
        .unwrap();
        assert!(!commit.verify());
    }

    #[test]
    fn object_kind_display() {
        assert_eq!(ObjectKind::Blob.to_string(), "blob");
        assert_eq!(ObjectKind::Tree.to_string(), "tree");
        assert_eq!(ObjectKind::Commit.to_string(), "commit");
    }
}
