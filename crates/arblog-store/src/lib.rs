//! Content-addressed object storage for arblog archives.
//!
//! Every committed version of an archive is a graph of immutable objects
//! identified by their BLAKE3 hash (domain-separated by object kind):
//!
//! - [`Blob`] -- file contents
//! - [`Tree`] -- directory listing mapping names to object references
//! - [`CommitObject`] -- signed version record pointing at a root tree
//!
//! Forked archives share every unchanged blob and tree with their source.
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written.
//! 2. Concurrent reads are always safe.
//! 3. The store never interprets object contents.
//! 4. All errors are propagated, never silently ignored.

pub mod error;
pub mod memory;
pub mod object;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryObjectStore;
pub use object::{Blob, CommitObject, EntryMode, ObjectKind, StoredObject, Tree, TreeEntry};
pub use traits::ObjectStore;
