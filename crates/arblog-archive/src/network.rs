//! Local, in-process archive network.
//!
//! [`MemoryNetwork`] keeps every archive of the process in one shared
//! content-addressed store. It tracks the published head commit of each
//! archive and the secret keys of the archives this process owns. There is
//! no replication: "reachable" means "published to this network".

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use arblog_crypto::SigningKey;
use arblog_store::{CommitObject, InMemoryObjectStore, ObjectStore};
use arblog_types::{ArchiveAddress, ObjectId};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::error::{ArchiveError, ArchiveResult};
use crate::memory::MemoryArchive;
use crate::traits::{Archive, ArchiveNetwork};
use crate::types::{ForkOptions, Manifest};
use crate::worktree::WorkTree;

/// State shared between the network and every handle it hands out.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) store: InMemoryObjectStore,
    pub(crate) clock: Arc<dyn Clock>,
    heads: RwLock<HashMap<ArchiveAddress, ObjectId>>,
    keys: RwLock<HashMap<ArchiveAddress, SigningKey>>,
}

impl Shared {
    pub(crate) fn head(&self, address: &ArchiveAddress) -> ArchiveResult<Option<ObjectId>> {
        let heads = self.heads.read().map_err(|_| ArchiveError::Poisoned)?;
        Ok(heads.get(address).copied())
    }

    pub(crate) fn publish(&self, address: ArchiveAddress, commit: ObjectId) -> ArchiveResult<()> {
        let mut heads = self.heads.write().map_err(|_| ArchiveError::Poisoned)?;
        heads.insert(address, commit);
        Ok(())
    }

    fn remember_key(&self, key: &SigningKey) -> ArchiveResult<()> {
        let mut keys = self.keys.write().map_err(|_| ArchiveError::Poisoned)?;
        keys.insert(key.address(), key.clone());
        Ok(())
    }

    fn key(&self, address: &ArchiveAddress) -> ArchiveResult<Option<SigningKey>> {
        let keys = self.keys.read().map_err(|_| ArchiveError::Poisoned)?;
        Ok(keys.get(address).cloned())
    }

    /// Load and verify the published head commit of `address`.
    fn head_commit(&self, address: &ArchiveAddress) -> ArchiveResult<(ObjectId, CommitObject)> {
        let id = self
            .head(address)?
            .ok_or(ArchiveError::Unreachable(*address))?;
        let commit = CommitObject::from_stored_object(&self.store.require(&id)?)?;
        if commit.archive != *address || !commit.verify() {
            return Err(ArchiveError::BadSignature(*address));
        }
        Ok((id, commit))
    }
}

/// In-process [`ArchiveNetwork`].
#[derive(Clone, Debug)]
pub struct MemoryNetwork {
    shared: Arc<Shared>,
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Use `clock` for every file timestamp and commit record.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            shared: Arc::new(Shared {
                store: InMemoryObjectStore::new(),
                clock,
                heads: RwLock::new(HashMap::new()),
                keys: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.shared.clock)
    }

    /// Concrete-typed variant of [`ArchiveNetwork::open`].
    pub fn open_archive(&self, address: &ArchiveAddress) -> ArchiveResult<MemoryArchive> {
        let (head, commit) = self.shared.head_commit(address)?;
        let tree = WorkTree::checkout(&self.shared.store, &commit.root)?;
        let key = self.shared.key(address)?;
        debug!(archive = %address.short_id(), version = commit.version, owner = key.is_some(), "opened archive");
        Ok(MemoryArchive::new(
            Arc::clone(&self.shared),
            *address,
            key,
            tree,
            Some(head),
            commit.version,
        ))
    }

    /// Concrete-typed variant of [`ArchiveNetwork::create`].
    pub async fn create_archive(&self, options: ForkOptions) -> ArchiveResult<MemoryArchive> {
        let key = SigningKey::generate();
        self.shared.remember_key(&key)?;
        let archive = MemoryArchive::new(
            Arc::clone(&self.shared),
            key.address(),
            Some(key),
            WorkTree::default(),
            None,
            0,
        );
        archive.write_manifest(&Manifest::from(options))?;
        archive.commit().await?;
        info!(archive = %archive.address().short_id(), "created archive");
        Ok(archive)
    }

    /// Concrete-typed variant of [`ArchiveNetwork::fork`].
    pub fn fork_archive(
        &self,
        source: &ArchiveAddress,
        options: ForkOptions,
    ) -> ArchiveResult<MemoryArchive> {
        let (head, commit) = self.shared.head_commit(source)?;
        let tree = WorkTree::checkout(&self.shared.store, &commit.root)?;
        let key = SigningKey::generate();
        self.shared.remember_key(&key)?;
        let fork = MemoryArchive::new(
            Arc::clone(&self.shared),
            key.address(),
            Some(key),
            tree,
            Some(head),
            0,
        );
        fork.write_manifest(&Manifest::from(options))?;
        info!(
            source = %source.short_id(),
            fork = %fork.address().short_id(),
            "forked archive"
        );
        Ok(fork)
    }

    /// The verified head commit of a published archive.
    pub fn head_commit(&self, address: &ArchiveAddress) -> ArchiveResult<CommitObject> {
        Ok(self.shared.head_commit(address)?.1)
    }

    /// Number of objects in the shared store.
    pub fn object_count(&self) -> usize {
        self.shared.store.len()
    }
}

impl Default for MemoryNetwork {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArchiveNetwork for MemoryNetwork {
    async fn open(&self, address: &ArchiveAddress) -> ArchiveResult<Arc<dyn Archive>> {
        Ok(Arc::new(self.open_archive(address)?))
    }

    async fn fork(
        &self,
        source: &ArchiveAddress,
        options: ForkOptions,
    ) -> ArchiveResult<Arc<dyn Archive>> {
        Ok(Arc::new(self.fork_archive(source, options)?))
    }

    async fn create(&self, options: ForkOptions) -> ArchiveResult<Arc<dyn Archive>> {
        Ok(Arc::new(self.create_archive(options).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ReaddirOptions, MANIFEST_PATH};

    #[tokio::test]
    async fn create_publishes_version_one() {
        let net = MemoryNetwork::new();
        let archive = net.create(ForkOptions::new("Blog", "About")).await.unwrap();
        let info = archive.get_info().await.unwrap();
        assert_eq!(info.version, 1);
        assert_eq!(info.title.as_deref(), Some("Blog"));
        assert!(info.is_owner);

        let commit = net.head_commit(archive.address()).unwrap();
        assert_eq!(commit.version, 1);
        assert!(commit.parent.is_none());
    }

    #[tokio::test]
    async fn open_unknown_address_is_unreachable() {
        let net = MemoryNetwork::new();
        let address = SigningKey::generate().address();
        let err = net.open(&address).await.err().unwrap();
        assert!(matches!(err, ArchiveError::Unreachable(a) if a == address));
    }

    #[tokio::test]
    async fn uncommitted_writes_are_invisible_to_other_openers() {
        let net = MemoryNetwork::new();
        let archive = net.create(ForkOptions::default()).await.unwrap();
        archive.write_file("/blog.json", b"{}").await.unwrap();

        let other = net.open(archive.address()).await.unwrap();
        assert!(other.read_file("/blog.json").await.unwrap_err().is_not_found());

        archive.commit().await.unwrap();
        let reopened = net.open(archive.address()).await.unwrap();
        assert_eq!(reopened.read_file("/blog.json").await.unwrap(), b"{}");
        assert_eq!(reopened.get_info().await.unwrap().version, 2);
    }

    #[tokio::test]
    async fn fork_copies_content_and_rewrites_manifest() {
        let net = MemoryNetwork::new();
        let source = net.create(ForkOptions::new("Source", "S")).await.unwrap();
        source.write_file("articles/a.md", b"title: A").await.unwrap();
        source.commit().await.unwrap();

        let fork = net
            .fork(source.address(), ForkOptions::new("Fork", "F"))
            .await
            .unwrap();
        assert_ne!(fork.address(), source.address());
        assert_eq!(fork.read_file("/articles/a.md").await.unwrap(), b"title: A");

        let manifest: Manifest =
            serde_json::from_slice(&fork.read_file(MANIFEST_PATH).await.unwrap()).unwrap();
        assert_eq!(manifest.title.as_deref(), Some("Fork"));

        // Unpublished until committed.
        assert!(net.open(fork.address()).await.is_err());
        let receipt = fork.commit().await.unwrap();
        assert_eq!(receipt.version, 1);
        let commit = net.head_commit(fork.address()).unwrap();
        assert_eq!(commit.parent, net.shared.head(source.address()).unwrap());

        let listing = net
            .open(fork.address())
            .await
            .unwrap()
            .readdir("/", ReaddirOptions::default())
            .await
            .unwrap();
        let names: Vec<_> = listing.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["articles", "dat.json"]);
    }

    #[tokio::test]
    async fn forks_share_unchanged_objects() {
        let net = MemoryNetwork::new();
        let source = net.create(ForkOptions::default()).await.unwrap();
        source.write_file("big.bin", &[7u8; 4096]).await.unwrap();
        source.commit().await.unwrap();
        let before = net.object_count();

        let fork = net.fork(source.address(), ForkOptions::default()).await.unwrap();
        fork.commit().await.unwrap();
        // The blob is shared; only manifest, trees and the commit are new.
        assert!(net.object_count() - before <= 4);
    }

    #[tokio::test]
    async fn non_owner_handle_is_read_only() {
        let owner = MemoryNetwork::new();
        let archive = owner.create(ForkOptions::default()).await.unwrap();

        // A second network sharing nothing but the store contents would not
        // know the key; simulate by forgetting it.
        owner.shared.keys.write().unwrap().clear();
        let reader = owner.open(archive.address()).await.unwrap();
        assert!(!reader.get_info().await.unwrap().is_owner);
        assert!(matches!(
            reader.write_file("x", b"y").await,
            Err(ArchiveError::ReadOnly(_))
        ));
    }
}
