use arblog_types::ObjectId;

/// Domain-separated BLAKE3 content hasher.
///
/// The domain tag is prepended to every hash so that a file body and a
/// directory listing with identical bytes never share an id.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// File contents.
    pub const BLOB: Self = Self {
        domain: "arblog-blob-v1",
    };
    /// Directory listings.
    pub const TREE: Self = Self {
        domain: "arblog-tree-v1",
    };
    /// Signed version records.
    pub const COMMIT: Self = Self {
        domain: "arblog-commit-v1",
    };

    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ObjectId::from_hash(*hasher.finalize().as_bytes())
    }

    pub fn verify(&self, data: &[u8], expected: &ObjectId) -> bool {
        self.hash(data) == *expected
    }

    pub fn domain(&self) -> &str {
        self.domain
    }
}
