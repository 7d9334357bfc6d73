//! Snapshot engine: walk, fingerprint, build views and persist them.
//!
//! One run reads the configured root once, fingerprints every accepted file
//! under a shared concurrency cap, builds the root manifest and its
//! per-directory views, then reconciles each view with the snapshot already
//! on disk. Only a bad root or configuration fails the run as a whole; every
//! other failure is recorded in the [`RunReport`] against the entry or target
//! it concerns.

use crate::config::SnapshotConfig;
use crate::error::{FingerprintError, SnapshotError, WalkError};
use crate::fingerprint::{fingerprinter_for, Fingerprinter};
use crate::ignore::{read_ignore_file, IgnoreList};
use crate::manifest::builder::{DirectoryView, ManifestBuilder, RootManifest};
use crate::manifest::digest::SealedManifest;
use crate::manifest::merge::derive_created_at;
use crate::manifest::writer::{temp_name_for, SnapshotWriter, WriteOutcome};
use crate::manifest::{FileRecord, Manifest};
use crate::tree::path::{canonicalize_root, join_key, relative_segments, KeyLayout};
use crate::tree::walker::{Walker, WalkerConfig};
use crate::types::{EpochMillis, Identity};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

/// Directory snapshot engine
pub struct SnapshotEngine {
    config: SnapshotConfig,
    fingerprinter: Arc<dyn Fingerprinter>,
}

impl std::fmt::Debug for SnapshotEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotEngine")
            .field("config", &self.config)
            .field("strategy", &self.fingerprinter.strategy())
            .finish()
    }
}

/// A file whose identity could not be computed
#[derive(Debug)]
pub struct FingerprintFailure {
    pub path: PathBuf,
    pub error: FingerprintError,
}

/// A view whose snapshot could not be written
#[derive(Debug)]
pub struct TargetFailure {
    pub target: PathBuf,
    pub error: SnapshotError,
}

/// A snapshot written during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenSnapshot {
    /// Directory key relative to the traversal root (`""` for the root)
    pub directory: String,
    pub target: PathBuf,
    pub sealed: SealedManifest,
}

/// Everything computed before any snapshot is written
#[derive(Debug)]
pub struct Computation {
    /// Canonical traversal root
    pub root: PathBuf,
    pub root_manifest: RootManifest,
    /// Views to persist, root first
    pub views: Vec<DirectoryView>,
    pub walk_errors: Vec<WalkError>,
    pub fingerprint_failures: Vec<FingerprintFailure>,
}

/// Outcome of a full run
#[derive(Debug)]
pub struct RunReport {
    /// Canonical traversal root
    pub root: PathBuf,
    pub root_manifest: RootManifest,
    /// Written snapshots, sorted by target path
    pub written: Vec<WrittenSnapshot>,
    /// Targets left alone by the write policy, sorted
    pub skipped: Vec<PathBuf>,
    pub failures: Vec<TargetFailure>,
    pub walk_errors: Vec<WalkError>,
    pub fingerprint_failures: Vec<FingerprintFailure>,
}

impl RunReport {
    /// Number of files recorded in the root manifest
    pub fn files(&self) -> usize {
        self.root_manifest.manifest().len()
    }

    /// The snapshot written for the traversal root, if any
    pub fn root_snapshot(&self) -> Option<&WrittenSnapshot> {
        self.written.iter().find(|w| w.directory.is_empty())
    }

    /// Digest of the root snapshot, if it was written
    pub fn root_digest(&self) -> Option<&str> {
        self.root_snapshot().map(|w| w.sealed.digest())
    }

    /// Written snapshot for a directory key
    pub fn snapshot_for(&self, directory: &str) -> Option<&WrittenSnapshot> {
        self.written.iter().find(|w| w.directory == directory)
    }

    /// True when nothing failed anywhere
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
            && self.walk_errors.is_empty()
            && self.fingerprint_failures.is_empty()
    }
}

impl SnapshotEngine {
    /// Engine using the fingerprinter for the configured strategy
    pub fn new(config: SnapshotConfig) -> Result<Self, SnapshotError> {
        let fingerprinter = fingerprinter_for(config.strategy);
        Self::with_fingerprinter(config, fingerprinter)
    }

    /// Engine with a caller-supplied fingerprinter; `config.strategy` is ignored
    pub fn with_fingerprinter(
        config: SnapshotConfig,
        fingerprinter: Arc<dyn Fingerprinter>,
    ) -> Result<Self, SnapshotError> {
        config.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            SnapshotError::InvalidConfig(messages.join("; "))
        })?;
        Ok(Self {
            config,
            fingerprinter,
        })
    }

    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    /// Walk, fingerprint and build views without touching any snapshot.
    #[instrument(skip(self), fields(root = %self.config.root.display(), strategy = %self.fingerprinter.strategy()))]
    pub async fn compute(&self) -> Result<Computation, SnapshotError> {
        let started = Instant::now();
        let root = canonicalize_root(&self.config.root)?;
        let layout = KeyLayout::new(&self.config.root, self.config.cutoff)?;
        let (ignore, ignore_error) = self.ignore_list(&root);

        let mut walk = Walker::with_config(
            root.clone(),
            WalkerConfig {
                ignore,
                extension: self.config.extension.clone(),
                reserved_names: vec![
                    self.config.target_name.clone(),
                    temp_name_for(&self.config.target_name),
                ],
                max_concurrency: self.config.max_concurrency,
            },
        )
        .walk()
        .collect_all()
        .await;
        walk.errors.extend(ignore_error);

        for error in &walk.errors {
            warn!(path = %error.path().display(), error = %error, "Traversal error");
        }
        debug!(
            files = walk.files.len(),
            snapshots = walk.reserved.len(),
            errors = walk.errors.len(),
            "Walk finished"
        );

        let (records, fingerprint_failures) = self.fingerprint_all(walk.files).await?;

        let mut builder = ManifestBuilder::new(layout);
        for (path, record) in records {
            let Some(relative) = relative_segments(&root, &path) else {
                debug!(path = %path.display(), "Walked path outside root skipped");
                continue;
            };
            builder.add(&relative, record);
        }
        let root_manifest = builder.finish();

        let mut views = root_manifest.views();
        let stale = self.stale_snapshot_dirs(&root, &walk.reserved, &views);
        for dir in stale {
            debug!(directory = %join_key(&dir), "Snapshot without remaining files");
            views.push(DirectoryView::empty(dir));
        }

        info!(
            files = root_manifest.manifest().len(),
            views = views.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Snapshot computed"
        );

        Ok(Computation {
            root,
            root_manifest,
            views,
            walk_errors: walk.errors,
            fingerprint_failures,
        })
    }

    /// Compute and persist every view according to the write policy.
    #[instrument(skip(self), fields(root = %self.config.root.display(), policy = %self.config.write_policy))]
    pub async fn run(&self) -> Result<RunReport, SnapshotError> {
        let computation = self.compute().await?;
        let writer = Arc::new(SnapshotWriter::new(
            self.config.target_name.clone(),
            self.config.indent,
            self.config.write_policy,
        ));
        let permits = Arc::new(Semaphore::new(self.config.max_concurrency));

        let mut tasks = JoinSet::new();
        for view in computation.views {
            let directory = view.directory(&computation.root);
            let writer = Arc::clone(&writer);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let key = view.key();
                let target = writer.target_for(&directory);
                let Ok(_permit) = permits.acquire_owned().await else {
                    return (key, target, Ok(WriteOutcome::Skipped));
                };
                let outcome = writer.reconcile(&directory, view.manifest).await;
                (key, target, outcome)
            });
        }

        let mut written = Vec::new();
        let mut skipped = Vec::new();
        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (directory, target, outcome) = joined?;
            match outcome {
                Ok(WriteOutcome::Written(sealed)) => {
                    debug!(target = %target.display(), digest = %sealed.digest(), "View written");
                    written.push(WrittenSnapshot {
                        directory,
                        target,
                        sealed,
                    });
                }
                Ok(WriteOutcome::Skipped) => skipped.push(target),
                Err(error) => {
                    warn!(target = %target.display(), error = %error, "Failed to write snapshot");
                    failures.push(TargetFailure { target, error });
                }
            }
        }
        written.sort_by(|a, b| a.target.cmp(&b.target));
        skipped.sort();
        failures.sort_by(|a, b| a.target.cmp(&b.target));

        let report = RunReport {
            root: computation.root,
            root_manifest: computation.root_manifest,
            written,
            skipped,
            failures,
            walk_errors: computation.walk_errors,
            fingerprint_failures: computation.fingerprint_failures,
        };
        info!(
            files = report.files(),
            written = report.written.len(),
            skipped = report.skipped.len(),
            failures = report.failures.len(),
            traversal_errors = report.walk_errors.len(),
            fingerprint_failures = report.fingerprint_failures.len(),
            "Snapshot run finished"
        );
        Ok(report)
    }

    /// Configured entries plus those of the ignore file. An unreadable
    /// ignore file leaves the configured entries in force.
    fn ignore_list(&self, root: &Path) -> (IgnoreList, Option<WalkError>) {
        let mut ignore = IgnoreList::new(&self.config.ignore);
        let Some(ignore_file) = &self.config.ignore_file else {
            return (ignore, None);
        };
        match read_ignore_file(&root.join(ignore_file)) {
            Ok(from_file) => {
                if !from_file.is_empty() {
                    debug!(entries = from_file.len(), "Ignore file entries added");
                    ignore.extend(&from_file);
                }
                (ignore, None)
            }
            Err(error) => (ignore, Some(error)),
        }
    }

    async fn fingerprint_all(
        &self,
        files: Vec<PathBuf>,
    ) -> Result<(Vec<(PathBuf, FileRecord)>, Vec<FingerprintFailure>), SnapshotError> {
        let permits = Arc::new(Semaphore::new(self.config.max_concurrency));
        let mut tasks = JoinSet::new();
        for path in files {
            let fingerprinter = Arc::clone(&self.fingerprinter);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await;
                let identity = fingerprinter.fingerprint(&path).await;
                let created_at = match &identity {
                    Ok(_) => created_at_of(&path).await,
                    Err(_) => None,
                };
                (path, identity, created_at)
            });
        }

        let mut records = Vec::new();
        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (path, identity, created_at) = joined?;
            let identity: Option<Identity> = match identity {
                Ok(identity) => Some(identity),
                Err(error) => {
                    warn!(path = %path.display(), error = %error, "Fingerprint failed; recorded without identity");
                    failures.push(FingerprintFailure {
                        path: path.clone(),
                        error,
                    });
                    None
                }
            };
            records.push((path, FileRecord::new(identity, created_at)));
        }
        // Lossy file names can collide on one key; path order decides which record survives
        records.sort_by(|a, b| a.0.cmp(&b.0));
        failures.sort_by(|a, b| a.path.cmp(&b.path));
        Ok((records, failures))
    }

    /// Directories holding a snapshot of ours that no view covers any more
    fn stale_snapshot_dirs(
        &self,
        root: &Path,
        reserved: &[PathBuf],
        views: &[DirectoryView],
    ) -> BTreeSet<Vec<String>> {
        let covered: BTreeSet<&[String]> = views.iter().map(|v| v.dir.as_slice()).collect();
        reserved
            .iter()
            .filter(|path| {
                path.file_name()
                    .is_some_and(|name| name.to_string_lossy() == self.config.target_name)
            })
            .filter_map(|path| relative_segments(root, path.parent()?))
            .filter(|dir| !covered.contains(dir.as_slice()))
            .collect()
    }
}

async fn created_at_of(path: &Path) -> Option<EpochMillis> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => derive_created_at(&metadata),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "No metadata for createdAt");
            None
        }
    }
}

/// Root manifest for `config`, computed without reading or writing any snapshot
pub async fn snapshot_manifest(config: SnapshotConfig) -> Result<Manifest, SnapshotError> {
    let engine = SnapshotEngine::new(config)?;
    Ok(engine.compute().await?.root_manifest.into_manifest())
}
