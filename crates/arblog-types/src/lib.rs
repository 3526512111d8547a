//! Foundation types for arblog.
//!
//! Every other arblog crate depends on `arblog-types`. The two identifiers
//! defined here are the only names an archive ever has:
//!
//! - [`ObjectId`] -- content address of an immutable stored object (BLAKE3)
//! - [`ArchiveAddress`] -- network address of a mutable archive (its public key)

pub mod address;
pub mod error;
pub mod object;

pub use address::ArchiveAddress;
pub use error::TypeError;
pub use object::ObjectId;
