//! Cryptographic primitives for arblog archives.
//!
//! - [`ContentHasher`] -- domain-separated BLAKE3 hashing for stored objects
//! - [`SigningKey`] / [`VerifyingKey`] -- the Ed25519 key pair that owns an
//!   archive; the public half is the archive's network address
//! - [`Signature`] -- commit signatures
//!
//! All crypto operations wrap established libraries.

pub mod hasher;
pub mod signer;

pub use hasher::ContentHasher;
pub use signer::{Signature, SignatureError, SigningKey, VerifyingKey};
