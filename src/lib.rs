//! dirsnap: Per-Directory Filesystem Snapshots
//!
//! Walks a directory tree, fingerprints every file with a pluggable strategy
//! and persists one canonical, digest-verified JSON manifest per directory.
//! Later runs carry each file's first-seen `createdAt` forward so manifests
//! stay stable while identities change.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod ignore;
pub mod logging;
pub mod manifest;
pub mod tree;
pub mod types;

pub use config::{DirsnapConfig, SnapshotConfig};
pub use engine::{RunReport, SnapshotEngine};
pub use error::{FingerprintError, SnapshotError, WalkError};
pub use fingerprint::Strategy;
pub use manifest::writer::WritePolicy;
