//! CLI presentation: text tables and JSON documents for command results.

use crate::engine::{Computation, RunReport};
use crate::error::SnapshotError;
use crate::manifest::digest::ParsedSnapshot;
use crate::manifest::writer::Verification;
use crate::manifest::Manifest;
use crate::types::EpochMillis;
use chrono::{DateTime, Utc};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde_json::json;
use std::path::Path;

fn display_created_at(created_at: Option<EpochMillis>) -> String {
    created_at
        .and_then(|ms| i64::try_from(ms).ok())
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn manifest_table(manifest: &Manifest) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Path", "Identity", "Created At"]);
    for (key, record) in manifest {
        let identity = record
            .identity
            .as_ref()
            .map(|identity| identity.to_string())
            .unwrap_or_else(|| "null".to_string());
        table.add_row(vec![
            key.clone(),
            identity,
            display_created_at(record.created_at),
        ]);
    }
    table
}

fn relative_to<'a>(root: &Path, path: &'a Path) -> std::borrow::Cow<'a, str> {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
}

/// Summary of a snapshot run
pub fn format_run_report_text(report: &RunReport) -> String {
    let mut lines = vec![format!(
        "{} files, {} snapshots written, {} skipped",
        report.files(),
        report.written.len(),
        report.skipped.len()
    )];
    if let Some(digest) = report.root_digest() {
        lines.push(format!("root digest: {}", digest));
    }

    if !report.written.is_empty() {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Snapshot", "Entries", "Digest"]);
        for written in &report.written {
            table.add_row(vec![
                relative_to(&report.root, &written.target).into_owned(),
                written.sealed.manifest().len().to_string(),
                written.sealed.digest().to_string(),
            ]);
        }
        lines.push(table.to_string());
    }

    for failure in &report.failures {
        lines.push(format!(
            "{} {}: {}",
            "failed".red(),
            relative_to(&report.root, &failure.target),
            failure.error
        ));
    }
    for error in &report.walk_errors {
        lines.push(format!("{} {}", "traversal error".yellow(), error));
    }
    for failure in &report.fingerprint_failures {
        lines.push(format!(
            "{} {}: {}",
            "no identity".yellow(),
            relative_to(&report.root, &failure.path),
            failure.error
        ));
    }
    lines.join("\n")
}

pub fn format_run_report_json(report: &RunReport) -> Result<String, SnapshotError> {
    let written: Vec<serde_json::Value> = report
        .written
        .iter()
        .map(|w| {
            json!({
                "directory": w.directory,
                "target": w.target,
                "entries": w.sealed.manifest().len(),
                "digest": w.sealed.digest(),
            })
        })
        .collect();
    let failures: Vec<serde_json::Value> = report
        .failures
        .iter()
        .map(|f| json!({ "target": f.target, "error": f.error.to_string() }))
        .collect();
    let walk_errors: Vec<serde_json::Value> = report
        .walk_errors
        .iter()
        .map(|e| json!({ "path": e.path(), "error": e.to_string() }))
        .collect();
    let fingerprint_failures: Vec<serde_json::Value> = report
        .fingerprint_failures
        .iter()
        .map(|f| json!({ "path": f.path, "error": f.error.to_string() }))
        .collect();

    Ok(serde_json::to_string_pretty(&json!({
        "root": report.root,
        "files": report.files(),
        "root_digest": report.root_digest(),
        "written": written,
        "skipped": report.skipped,
        "failures": failures,
        "walk_errors": walk_errors,
        "fingerprint_failures": fingerprint_failures,
    }))?)
}

/// Root manifest of a dry run
pub fn format_computation_text(computation: &Computation) -> String {
    let manifest = computation.root_manifest.manifest();
    format!(
        "{}\n{} files in {} views (dry run, nothing written)",
        manifest_table(manifest),
        manifest.len(),
        computation.views.len()
    )
}

pub fn format_computation_json(computation: &Computation) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string_pretty(
        computation.root_manifest.manifest(),
    )?)
}

pub fn format_verifications_text(verifications: &[Verification]) -> String {
    verifications
        .iter()
        .map(|v| {
            let status = if v.is_valid() {
                "ok".green().to_string()
            } else if v.recorded.is_none() {
                "no digest".red().to_string()
            } else {
                "mismatch".red().to_string()
            };
            format!(
                "{} {} ({} entries, digest {})",
                status,
                v.path.display(),
                v.entries,
                v.computed
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_verifications_json(verifications: &[Verification]) -> Result<String, SnapshotError> {
    let rows: Vec<serde_json::Value> = verifications
        .iter()
        .map(|v| {
            json!({
                "path": v.path,
                "entries": v.entries,
                "recorded": v.recorded,
                "computed": v.computed,
                "valid": v.is_valid(),
            })
        })
        .collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

pub fn format_snapshot_text(path: &Path, snapshot: &ParsedSnapshot) -> Result<String, SnapshotError> {
    let computed = snapshot.computed_digest()?;
    let digest_line = match &snapshot.recorded_digest {
        Some(recorded) if *recorded == computed => format!("digest {} {}", recorded, "(ok)".green()),
        Some(recorded) => format!("digest {} {}", recorded, "(mismatch)".red()),
        None => format!("digest {}", "(missing)".red()),
    };
    Ok(format!(
        "{}\n{}\n{}",
        path.display(),
        manifest_table(&snapshot.manifest),
        digest_line
    ))
}

pub fn format_snapshot_json(snapshot: &ParsedSnapshot) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string_pretty(&json!({
        "entries": snapshot.manifest,
        "digest": snapshot.recorded_digest,
    }))?)
}
