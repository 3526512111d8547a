//! [`MemoryArchive`]: one handle onto an archive of a [`MemoryNetwork`](crate::MemoryNetwork).

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use arblog_crypto::SigningKey;
use arblog_store::{CommitObject, ObjectStore};
use arblog_types::{ArchiveAddress, ObjectId};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{ArchiveError, ArchiveResult};
use crate::network::Shared;
use crate::path;
use crate::traits::Archive;
use crate::types::{
    ArchiveInfo, CommitReceipt, DirEntry, Manifest, ReaddirOptions, RmdirOptions, Stat,
    MANIFEST_PATH,
};
use crate::worktree::WorkTree;

#[derive(Debug)]
struct State {
    tree: WorkTree,
    /// Commit this handle's tree descends from.
    head: Option<ObjectId>,
    version: u64,
}

/// A handle with its own working tree.
///
/// Reads see this handle's own uncommitted writes. Other handles, including
/// ones opened later from the network, see only committed versions.
#[derive(Debug)]
pub struct MemoryArchive {
    shared: Arc<Shared>,
    address: ArchiveAddress,
    key: Option<SigningKey>,
    state: RwLock<State>,
}

impl MemoryArchive {
    pub(crate) fn new(
        shared: Arc<Shared>,
        address: ArchiveAddress,
        key: Option<SigningKey>,
        tree: WorkTree,
        head: Option<ObjectId>,
        version: u64,
    ) -> Self {
        Self {
            shared,
            address,
            key,
            state: RwLock::new(State {
                tree,
                head,
                version,
            }),
        }
    }

    pub fn is_owner(&self) -> bool {
        self.key.is_some()
    }

    fn read_state(&self) -> ArchiveResult<RwLockReadGuard<'_, State>> {
        self.state.read().map_err(|_| ArchiveError::Poisoned)
    }

    fn write_state(&self) -> ArchiveResult<RwLockWriteGuard<'_, State>> {
        if self.key.is_none() {
            return Err(ArchiveError::ReadOnly(self.address));
        }
        self.state.write().map_err(|_| ArchiveError::Poisoned)
    }

    fn now_ms(&self) -> i64 {
        self.shared.clock.now().timestamp_millis()
    }

    pub(crate) fn write_manifest(&self, manifest: &Manifest) -> ArchiveResult<()> {
        let data = serde_json::to_vec_pretty(manifest)
            .map_err(|e| ArchiveError::Store(arblog_store::StoreError::Serialization(e.to_string())))?;
        let target = path::normalize(MANIFEST_PATH)?;
        let now = self.now_ms();
        self.write_state()?
            .tree
            .write(&self.shared.store, &target, &data, now)
    }

    fn manifest(&self, state: &State) -> Manifest {
        let Ok(target) = path::normalize(MANIFEST_PATH) else {
            return Manifest::default();
        };
        state
            .tree
            .read(&self.shared.store, &target)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Archive for MemoryArchive {
    fn address(&self) -> &ArchiveAddress {
        &self.address
    }

    async fn read_file(&self, path: &str) -> ArchiveResult<Vec<u8>> {
        let target = path::normalize(path)?;
        self.read_state()?.tree.read(&self.shared.store, &target)
    }

    async fn readdir(&self, path: &str, options: ReaddirOptions) -> ArchiveResult<Vec<DirEntry>> {
        let target = path::normalize(path)?;
        self.read_state()?
            .tree
            .readdir(&target, options.recursive, options.stat)
    }

    async fn stat(&self, path: &str) -> ArchiveResult<Stat> {
        let target = path::normalize(path)?;
        let now = self.now_ms();
        self.read_state()?.tree.stat(&target, now)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> ArchiveResult<()> {
        let target = path::normalize(path)?;
        let now = self.now_ms();
        self.write_state()?
            .tree
            .write(&self.shared.store, &target, data, now)?;
        debug!(archive = %self.address.short_id(), path = %target, bytes = data.len(), "wrote file");
        Ok(())
    }

    async fn unlink(&self, path: &str) -> ArchiveResult<()> {
        let target = path::normalize(path)?;
        self.write_state()?.tree.unlink(&target)
    }

    async fn mkdir(&self, path: &str) -> ArchiveResult<()> {
        let target = path::normalize(path)?;
        let now = self.now_ms();
        self.write_state()?.tree.mkdir(&target, now)
    }

    async fn rmdir(&self, path: &str, options: RmdirOptions) -> ArchiveResult<()> {
        let target = path::normalize(path)?;
        self.write_state()?.tree.rmdir(&target, options.recursive)
    }

    async fn get_info(&self) -> ArchiveResult<ArchiveInfo> {
        let state = self.read_state()?;
        let manifest = self.manifest(&state);
        let (size, file_count) = state.tree.usage();
        Ok(ArchiveInfo {
            key: self.address.to_hex(),
            url: self.address.to_url(),
            version: state.version,
            title: manifest.title,
            description: manifest.description,
            is_owner: self.is_owner(),
            size,
            file_count,
        })
    }

    async fn commit(&self) -> ArchiveResult<CommitReceipt> {
        let key = self.key.as_ref().ok_or(ArchiveError::ReadOnly(self.address))?;
        let mut state = self.write_state()?;
        let root = state.tree.snapshot(&self.shared.store, "")?;
        let version = state.version + 1;
        let record = CommitObject {
            archive: self.address,
            version,
            parent: state.head,
            root,
            timestamp_ms: self.now_ms(),
            signature: None,
        }
        .sign(key)?;
        let commit = self.shared.store.write(&record.to_stored_object()?)?;
        self.shared.publish(self.address, commit)?;
        state.head = Some(commit);
        state.version = version;
        info!(
            archive = %self.address.short_id(),
            version,
            commit = %commit.short_hex(),
            "committed archive"
        );
        Ok(CommitReceipt { version, commit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::network::MemoryNetwork;
    use crate::types::{Encoding, ForkOptions};
    use chrono::{TimeZone, Utc};

    async fn fresh() -> (MemoryNetwork, Arc<ManualClock>, MemoryArchive) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap(),
        ));
        let net = MemoryNetwork::with_clock(clock.clone());
        let archive = net.create_archive(ForkOptions::new("T", "D")).await.unwrap();
        (net, clock, archive)
    }

    #[tokio::test]
    async fn read_text_and_paths() {
        let (_net, _clock, archive) = fresh().await;
        archive.write_file("articles/hello.md", b"title: Hi").await.unwrap();
        assert_eq!(archive.read_text("/articles/hello.md").await.unwrap(), "title: Hi");
        assert_eq!(archive.read_text("articles//hello.md").await.unwrap(), "title: Hi");
    }

    #[tokio::test]
    async fn read_text_rejects_invalid_utf8() {
        let (_net, _clock, archive) = fresh().await;
        archive.write_file("bin", &[0xff, 0xfe]).await.unwrap();
        assert!(matches!(
            archive.read_text("bin").await,
            Err(ArchiveError::InvalidEncoding { .. })
        ));
    }

    #[tokio::test]
    async fn write_encoded_base64_and_hex() {
        let (_net, _clock, archive) = fresh().await;
        archive
            .write_file_encoded("/author.png", "iVBORw0K", Encoding::Base64)
            .await
            .unwrap();
        assert_eq!(
            archive.read_file("author.png").await.unwrap(),
            [0x89, b'P', b'N', b'G', 0x0d, 0x0a]
        );
        archive
            .write_file_encoded("h.bin", "cafe", Encoding::Hex)
            .await
            .unwrap();
        assert_eq!(archive.read_file("h.bin").await.unwrap(), [0xca, 0xfe]);
        assert!(matches!(
            archive
                .write_file_encoded("bad", "!!!", Encoding::Base64)
                .await,
            Err(ArchiveError::InvalidEncoding { .. })
        ));
    }

    #[tokio::test]
    async fn stat_reports_clock_times() {
        let (_net, clock, archive) = fresh().await;
        let created = clock.now();
        archive.write_file("a.md", b"1").await.unwrap();
        clock.advance(chrono::Duration::days(1));
        archive.write_file("a.md", b"22").await.unwrap();
        let stat = archive.stat("/a.md").await.unwrap();
        assert_eq!(stat.ctime, created);
        assert_eq!(stat.mtime, created + chrono::Duration::days(1));
        assert_eq!(stat.size, 2);
    }

    #[tokio::test]
    async fn commit_preserves_ctime_across_reopen() {
        let (net, clock, archive) = fresh().await;
        let created = clock.now();
        archive.write_file("articles/a.md", b"x").await.unwrap();
        archive.commit().await.unwrap();
        clock.advance(chrono::Duration::hours(5));

        let reopened = net.open_archive(archive.address()).unwrap();
        let entries = reopened
            .readdir("/articles", ReaddirOptions::recursive_with_stat())
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].stat.as_ref().unwrap().ctime, created);
    }

    #[tokio::test]
    async fn info_counts_files() {
        let (_net, _clock, archive) = fresh().await;
        archive.write_file("style.css", b"body{}").await.unwrap();
        let info = archive.get_info().await.unwrap();
        assert_eq!(info.title.as_deref(), Some("T"));
        assert_eq!(info.description.as_deref(), Some("D"));
        assert_eq!(info.file_count, 2);
        assert_eq!(info.url, archive.address().to_url());
    }

    #[tokio::test]
    async fn commits_chain_versions() {
        let (net, _clock, archive) = fresh().await;
        let first = net.head_commit(archive.address()).unwrap();
        archive.write_file("x", b"1").await.unwrap();
        let receipt = archive.commit().await.unwrap();
        assert_eq!(receipt.version, 2);
        let second = net.head_commit(archive.address()).unwrap();
        assert_eq!(second.version, 2);
        assert!(second.parent.is_some());
        assert_ne!(first.root, second.root);
    }
}
