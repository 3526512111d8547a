//! The [`Archive`] and [`ArchiveNetwork`] interfaces.
//!
//! The blog layer only ever talks to these traits. Any backend (the local
//! [`MemoryNetwork`](crate::MemoryNetwork), a remote peer-to-peer daemon)
//! plugs in by implementing them.

use std::sync::Arc;

use arblog_types::ArchiveAddress;
use async_trait::async_trait;
use base64::Engine;

use crate::error::{ArchiveError, ArchiveResult};
use crate::types::{
    ArchiveInfo, CommitReceipt, DirEntry, Encoding, ForkOptions, ReaddirOptions, RmdirOptions,
    Stat,
};

/// Handle to one archive.
///
/// Paths may be given with or without a leading `/`. Mutating operations
/// fail with [`ArchiveError::ReadOnly`] when the process does not own the
/// archive, and nothing written is visible to other openers until
/// [`commit`](Archive::commit) succeeds.
#[async_trait]
pub trait Archive: Send + Sync {
    fn address(&self) -> &ArchiveAddress;

    /// Read a file's bytes. Fails with `NotFound` if missing.
    async fn read_file(&self, path: &str) -> ArchiveResult<Vec<u8>>;

    /// Read a file as UTF-8 text.
    async fn read_text(&self, path: &str) -> ArchiveResult<String> {
        let bytes = self.read_file(path).await?;
        String::from_utf8(bytes).map_err(|e| ArchiveError::InvalidEncoding {
            path: path.trim_start_matches('/').to_string(),
            reason: e.to_string(),
        })
    }

    /// List a directory. Fails with `NotFound` if missing.
    async fn readdir(&self, path: &str, options: ReaddirOptions) -> ArchiveResult<Vec<DirEntry>>;

    async fn stat(&self, path: &str) -> ArchiveResult<Stat>;

    /// Create or overwrite a file. Missing parent directories are created.
    async fn write_file(&self, path: &str, data: &[u8]) -> ArchiveResult<()>;

    /// Decode `data` with `encoding`, then write the resulting bytes.
    async fn write_file_encoded(
        &self,
        path: &str,
        data: &str,
        encoding: Encoding,
    ) -> ArchiveResult<()> {
        let invalid = |reason: String| ArchiveError::InvalidEncoding {
            path: path.trim_start_matches('/').to_string(),
            reason,
        };
        let bytes = match encoding {
            Encoding::Utf8 => data.as_bytes().to_vec(),
            Encoding::Base64 => base64::engine::general_purpose::STANDARD
                .decode(data.trim())
                .map_err(|e| invalid(e.to_string()))?,
            Encoding::Hex => hex::decode(data.trim()).map_err(|e| invalid(e.to_string()))?,
        };
        self.write_file(path, &bytes).await
    }

    /// Remove a file.
    async fn unlink(&self, path: &str) -> ArchiveResult<()>;

    /// Create a directory. Fails with `AlreadyExists` if anything is there.
    async fn mkdir(&self, path: &str) -> ArchiveResult<()>;

    /// Remove a directory, and with `recursive` everything below it.
    async fn rmdir(&self, path: &str, options: RmdirOptions) -> ArchiveResult<()>;

    async fn get_info(&self) -> ArchiveResult<ArchiveInfo>;

    /// Durability barrier: publish every write made so far as a new version.
    async fn commit(&self) -> ArchiveResult<CommitReceipt>;
}

/// Opens, creates and forks archives by address.
#[async_trait]
pub trait ArchiveNetwork: Send + Sync {
    /// Open the latest published version. Fails with `Unreachable` if the
    /// address is unknown.
    async fn open(&self, address: &ArchiveAddress) -> ArchiveResult<Arc<dyn Archive>>;

    /// Create a new, writable archive whose contents start as a copy of
    /// `source`, with the manifest rewritten from `options`. The fork is not
    /// reachable by address until it is committed.
    async fn fork(
        &self,
        source: &ArchiveAddress,
        options: ForkOptions,
    ) -> ArchiveResult<Arc<dyn Archive>>;

    /// Create and publish an empty archive holding only its manifest.
    async fn create(&self, options: ForkOptions) -> ArchiveResult<Arc<dyn Archive>>;
}
