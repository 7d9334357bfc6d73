//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Only scalar defaults live here; list and optional fields fall back to the
/// serde defaults on `SnapshotConfig`.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("snapshot.root", ".")?
        .set_default("snapshot.indent", 2)?
        .set_default("snapshot.write_policy", "always")?
        .set_default("snapshot.target_name", "manifest.json")?
        .set_default("snapshot.strategy", "mtime")?
        .set_default("snapshot.max_concurrency", 64)
}
