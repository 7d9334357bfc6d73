//! CLI parse: clap types for dirsnap. No behavior; definitions only.

use crate::fingerprint::Strategy;
use crate::manifest::writer::WritePolicy;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// dirsnap CLI - per-directory snapshot manifests
#[derive(Parser)]
#[command(name = "dirsnap")]
#[command(about = "Write hash-verifiable per-directory snapshot manifests")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Traversal root (default: configured root, else the current directory)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Configuration file path (overrides default config loading)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, global = true, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Walk the root and write one snapshot per directory
    Snapshot(SnapshotArgs),
    /// Recompute the digest of snapshots and compare with the recorded one
    Verify {
        /// Snapshot files, or directories holding one (default: the root)
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print the records of a snapshot
    Show {
        /// Snapshot file, or a directory holding one (default: the root)
        path: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

/// Overrides for a snapshot run; anything left unset comes from configuration
#[derive(Args, Debug, Default, Clone)]
pub struct SnapshotArgs {
    /// Fingerprint strategy (mtime, content, git-blob, git-commit)
    #[arg(long)]
    pub strategy: Option<Strategy>,

    /// Ignore entry; repeat to add more (replaces the configured list)
    #[arg(long = "ignore", value_name = "PATH")]
    pub ignore: Vec<String>,

    /// Leading segments of root/relative stripped from root keys
    #[arg(long)]
    pub cutoff: Option<usize>,

    /// Only record files whose name ends with this suffix
    #[arg(long)]
    pub extension: Option<String>,

    /// Spaces per indentation level (0 = compact)
    #[arg(long)]
    pub indent: Option<usize>,

    /// Write policy (always, if-exists)
    #[arg(long)]
    pub policy: Option<WritePolicy>,

    /// Snapshot file name
    #[arg(long)]
    pub target: Option<String>,

    /// Cap on concurrent directory reads, fingerprints and writes
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// Compute and print the root manifest without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
