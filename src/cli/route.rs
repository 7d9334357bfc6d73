//! CLI route: single route table and run context. Dispatches to the engine and presentation.

use crate::cli::parse::{Commands, OutputFormat, SnapshotArgs};
use crate::cli::presentation::{
    format_computation_json, format_computation_text, format_run_report_json,
    format_run_report_text, format_snapshot_json, format_snapshot_text,
    format_verifications_json, format_verifications_text,
};
use crate::config::{ConfigLoader, DirsnapConfig, SnapshotConfig};
use crate::engine::SnapshotEngine;
use crate::error::SnapshotError;
use crate::manifest::writer::{read_snapshot, verify_snapshot};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Printable result of a command. `success` is false when the command ran
/// but found problems (failed writes, digest mismatches).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    pub success: bool,
}

impl CommandOutput {
    fn ok(text: String) -> Self {
        Self {
            text,
            success: true,
        }
    }
}

/// Runtime context for CLI execution: resolved configuration.
/// Built from the optional root and config path using ConfigLoader only.
#[derive(Debug, Clone)]
pub struct RunContext {
    config: DirsnapConfig,
}

impl RunContext {
    /// Load configuration. An explicit `root` wins over any configured root.
    pub fn new(root: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<Self, SnapshotError> {
        let mut config = match (&config_path, &root) {
            (Some(path), _) => ConfigLoader::load_from_file(path)?,
            (None, Some(root)) => ConfigLoader::load(root)?,
            (None, None) => ConfigLoader::load(Path::new("."))?,
        };
        if let Some(root) = root {
            config.snapshot.root = root;
        }
        debug!(root = %config.snapshot.root.display(), "CLI context configured");
        Ok(Self { config })
    }

    /// Context over an already resolved configuration
    pub fn from_config(config: DirsnapConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DirsnapConfig {
        &self.config
    }

    /// Effective snapshot configuration: configured values with flags applied on top.
    pub fn snapshot_config(&self, args: &SnapshotArgs) -> SnapshotConfig {
        let mut config = self.config.snapshot.clone();
        if let Some(strategy) = args.strategy {
            config.strategy = strategy;
        }
        if !args.ignore.is_empty() {
            config.ignore = args.ignore.clone();
        }
        if args.cutoff.is_some() {
            config.cutoff = args.cutoff;
        }
        if args.extension.is_some() {
            config.extension = args.extension.clone();
        }
        if let Some(indent) = args.indent {
            config.indent = indent;
        }
        if let Some(policy) = args.policy {
            config.write_policy = policy;
        }
        if let Some(target) = &args.target {
            config.target_name = target.clone();
        }
        if let Some(max_concurrency) = args.max_concurrency {
            config.max_concurrency = max_concurrency;
        }
        config
    }

    /// Snapshot file for a command argument: directories resolve to the
    /// snapshot they hold, no argument to the root's snapshot.
    pub fn resolve_snapshot_path(&self, path: Option<&Path>) -> PathBuf {
        let path = path.unwrap_or(&self.config.snapshot.root);
        if path.is_dir() {
            path.join(&self.config.snapshot.target_name)
        } else {
            path.to_path_buf()
        }
    }

    pub async fn execute(&self, command: &Commands) -> Result<CommandOutput, SnapshotError> {
        let started = Instant::now();
        let result = self.execute_inner(command).await;
        info!(
            ok = result.as_ref().map(|o| o.success).unwrap_or(false),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    async fn execute_inner(&self, command: &Commands) -> Result<CommandOutput, SnapshotError> {
        match command {
            Commands::Snapshot(args) => self.handle_snapshot(args).await,
            Commands::Verify { paths, format } => self.handle_verify(paths, *format).await,
            Commands::Show { path, format } => self.handle_show(path.as_deref(), *format).await,
        }
    }

    async fn handle_snapshot(&self, args: &SnapshotArgs) -> Result<CommandOutput, SnapshotError> {
        let engine = SnapshotEngine::new(self.snapshot_config(args))?;

        if args.dry_run {
            let computation = engine.compute().await?;
            let text = match args.format {
                OutputFormat::Text => format_computation_text(&computation),
                OutputFormat::Json => format_computation_json(&computation)?,
            };
            return Ok(CommandOutput::ok(text));
        }

        let report = engine.run().await?;
        let text = match args.format {
            OutputFormat::Text => format_run_report_text(&report),
            OutputFormat::Json => format_run_report_json(&report)?,
        };
        Ok(CommandOutput {
            text,
            success: report.failures.is_empty(),
        })
    }

    async fn handle_verify(
        &self,
        paths: &[PathBuf],
        format: OutputFormat,
    ) -> Result<CommandOutput, SnapshotError> {
        let targets: Vec<PathBuf> = if paths.is_empty() {
            vec![self.resolve_snapshot_path(None)]
        } else {
            paths
                .iter()
                .map(|p| self.resolve_snapshot_path(Some(p)))
                .collect()
        };

        let mut verifications = Vec::with_capacity(targets.len());
        for target in &targets {
            verifications.push(verify_snapshot(target).await?);
        }

        let text = match format {
            OutputFormat::Text => format_verifications_text(&verifications),
            OutputFormat::Json => format_verifications_json(&verifications)?,
        };
        Ok(CommandOutput {
            text,
            success: verifications.iter().all(|v| v.is_valid()),
        })
    }

    async fn handle_show(
        &self,
        path: Option<&Path>,
        format: OutputFormat,
    ) -> Result<CommandOutput, SnapshotError> {
        let target = self.resolve_snapshot_path(path);
        let snapshot = read_snapshot(&target).await?;
        let text = match format {
            OutputFormat::Text => format_snapshot_text(&target, &snapshot)?,
            OutputFormat::Json => format_snapshot_json(&snapshot)?,
        };
        Ok(CommandOutput::ok(text))
    }
}
