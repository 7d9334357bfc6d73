//! Filesystem side of a snapshot run
//!
//! Path canonicalization and key formation, content hashing, and the bounded
//! concurrent walker that produces the files to fingerprint.

pub mod hasher;
pub mod path;
pub mod walker;
