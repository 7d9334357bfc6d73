//! Filesystem walker for traversing directory structures.
//!
//! Directories are read as concurrent tasks (one per directory, joined by a
//! single driver) with the number of directories open at once capped by a
//! semaphore. Files are streamed to the consumer as they are found, so the
//! resulting [`Walk`] is lazy and can be consumed only once.
//!
//! Links to directories inside the root are not descended: the target is
//! reached through its real path, so every directory is read exactly once
//! and under the same name regardless of task scheduling.

use crate::error::WalkError;
use crate::ignore::IgnoreList;
use crate::tree::path::relative_segments;
use futures::Stream;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::fs;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, trace, warn};

const CHANNEL_CAPACITY: usize = 1024;

/// Default cap on concurrently open directories
pub const DEFAULT_MAX_CONCURRENCY: usize = 64;

/// One item produced by a walk
#[derive(Debug)]
pub enum WalkItem {
    /// An accepted file (absolute path under the root)
    File(PathBuf),
    /// A file carrying one of the reserved names, i.e. a previously written
    /// snapshot. Never fingerprinted.
    Reserved(PathBuf),
    /// A single entry that could not be read; siblings are unaffected
    Error(WalkError),
}

/// Filesystem walker configuration
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Entries to skip (with their whole subtree)
    pub ignore: IgnoreList,
    /// Only files whose name ends with this suffix are yielded
    pub extension: Option<String>,
    /// File names reported as [`WalkItem::Reserved`] instead of as files
    pub reserved_names: Vec<String>,
    /// Maximum number of directories read concurrently
    pub max_concurrency: usize,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            ignore: IgnoreList::default(),
            extension: None,
            reserved_names: Vec::new(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl WalkerConfig {
    fn classify_file(&self, path: &Path) -> Option<bool> {
        let name = path.file_name()?.to_string_lossy();
        if self.reserved_names.iter().any(|reserved| *reserved == name) {
            return Some(false);
        }
        match &self.extension {
            Some(suffix) if !name.ends_with(suffix.as_str()) => None,
            _ => Some(true),
        }
    }
}

/// Filesystem walker
pub struct Walker {
    root: PathBuf,
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given (canonical) root path
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            config: WalkerConfig::default(),
        }
    }

    /// Create a walker with custom configuration
    pub fn with_config(root: PathBuf, config: WalkerConfig) -> Self {
        Self { root, config }
    }

    /// Start the traversal. Must be called from within a tokio runtime.
    ///
    /// The walk ends once every directory task has been joined.
    pub fn walk(self) -> Walk {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(drive(self.root, Arc::new(self.config), tx));
        Walk { rx }
    }
}

/// Lazy stream of walk items
pub struct Walk {
    rx: mpsc::Receiver<WalkItem>,
}

impl Walk {
    /// Drain the walk into accepted files, reserved files and errors
    pub async fn collect_all(mut self) -> WalkSummary {
        let mut summary = WalkSummary::default();
        while let Some(item) = self.rx.recv().await {
            match item {
                WalkItem::File(path) => summary.files.push(path),
                WalkItem::Reserved(path) => summary.reserved.push(path),
                WalkItem::Error(error) => summary.errors.push(error),
            }
        }
        summary.files.sort();
        summary.reserved.sort();
        summary
    }
}

impl Stream for Walk {
    type Item = WalkItem;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Fully drained walk
#[derive(Debug, Default)]
pub struct WalkSummary {
    pub files: Vec<PathBuf>,
    pub reserved: Vec<PathBuf>,
    pub errors: Vec<WalkError>,
}

async fn drive(root: PathBuf, config: Arc<WalkerConfig>, tx: mpsc::Sender<WalkItem>) {
    let permits = Arc::new(Semaphore::new(config.max_concurrency.max(1)));
    let root = Arc::new(root);
    let mut pending = JoinSet::new();
    pending.spawn(read_directory(
        Arc::clone(&root),
        root.as_ref().clone(),
        Arc::clone(&config),
        Arc::clone(&permits),
        tx.clone(),
    ));

    while let Some(joined) = pending.join_next().await {
        let subdirectories = match joined {
            Ok(subdirectories) => subdirectories,
            Err(e) => {
                warn!(error = %e, "Directory task failed");
                continue;
            }
        };
        for subdirectory in subdirectories {
            pending.spawn(read_directory(
                Arc::clone(&root),
                subdirectory,
                Arc::clone(&config),
                Arc::clone(&permits),
                tx.clone(),
            ));
        }
    }
    trace!("Walk complete");
}

async fn read_directory(
    root: Arc<PathBuf>,
    dir: PathBuf,
    config: Arc<WalkerConfig>,
    permits: Arc<Semaphore>,
    tx: mpsc::Sender<WalkItem>,
) -> Vec<PathBuf> {
    let mut subdirectories = Vec::new();
    let Ok(_permit) = permits.acquire_owned().await else {
        return subdirectories;
    };

    let mut reader = match fs::read_dir(&dir).await {
        Ok(reader) => reader,
        Err(source) => {
            report(&tx, WalkError::Io { path: dir, source }).await;
            return subdirectories;
        }
    };

    loop {
        let entry = match reader.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(source) => {
                report(
                    &tx,
                    WalkError::Io {
                        path: dir.clone(),
                        source,
                    },
                )
                .await;
                break;
            }
        };

        let path = entry.path();
        let Some(relative) = relative_segments(&root, &path) else {
            continue;
        };
        if config.ignore.is_ignored(&relative) {
            trace!(path = %path.display(), "Ignored");
            continue;
        }

        let file_type = match entry.file_type().await {
            Ok(file_type) => file_type,
            Err(source) => {
                report(&tx, WalkError::Io { path, source }).await;
                continue;
            }
        };

        let is_dir = if file_type.is_symlink() {
            let target = match dunce::canonicalize(&path) {
                Ok(target) => target,
                Err(source) => {
                    report(&tx, WalkError::Io { path, source }).await;
                    continue;
                }
            };
            if !target.starts_with(root.as_ref()) {
                report(&tx, WalkError::OutsideRoot { path, target }).await;
                continue;
            }
            match fs::metadata(&target).await {
                Ok(metadata) if metadata.is_dir() => {
                    debug!(path = %path.display(), target = %target.display(), "Directory link not descended");
                    continue;
                }
                Ok(_) => false,
                Err(source) => {
                    report(&tx, WalkError::Io { path, source }).await;
                    continue;
                }
            }
        } else {
            file_type.is_dir()
        };

        if is_dir {
            subdirectories.push(path);
            continue;
        }

        let item = match config.classify_file(&path) {
            Some(true) => WalkItem::File(path),
            Some(false) => WalkItem::Reserved(path),
            None => continue,
        };
        if tx.send(item).await.is_err() {
            // Consumer dropped the walk
            return Vec::new();
        }
    }

    subdirectories
}

async fn report(tx: &mpsc::Sender<WalkItem>, error: WalkError) {
    warn!(path = %error.path().display(), error = %error, "Skipping unreadable entry");
    let _ = tx.send(WalkItem::Error(error)).await;
}
