//! The archive capability consumed by arblog.
//!
//! An archive is a versioned virtual filesystem identified by an
//! [`ArchiveAddress`](arblog_types::ArchiveAddress). Writes land in a working
//! tree and only become visible to other openers after [`Archive::commit`],
//! which snapshots the tree into the object store and publishes a signed
//! commit.
//!
//! # Modules
//!
//! - [`traits`] -- the [`Archive`] and [`ArchiveNetwork`] interfaces
//! - [`types`] -- stats, directory entries, options and archive info
//! - [`path`] -- path normalization shared by every backend
//! - [`clock`] -- time source for file timestamps
//! - [`network`] / [`memory`] -- local in-process implementation

pub mod clock;
pub mod error;
pub mod memory;
pub mod network;
pub mod path;
pub mod traits;
pub mod types;
mod worktree;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ArchiveError, ArchiveResult};
pub use memory::MemoryArchive;
pub use network::MemoryNetwork;
pub use traits::{Archive, ArchiveNetwork};
pub use types::{
    ArchiveInfo, CommitReceipt, DirEntry, Encoding, FileKind, ForkOptions, Manifest,
    ReaddirOptions, RmdirOptions, Stat, MANIFEST_PATH,
};
