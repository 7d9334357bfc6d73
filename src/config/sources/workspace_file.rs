//! Workspace config file source: <root>/dirsnap.toml

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use config::FileFormat;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the per-root configuration file
pub const WORKSPACE_CONFIG_NAME: &str = "dirsnap.toml";

pub fn workspace_config_path(root: &Path) -> PathBuf {
    root.join(WORKSPACE_CONFIG_NAME)
}

/// Add the workspace config file to builder when present.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let path = workspace_config_path(root);
    if !path.is_file() {
        return Ok(builder);
    }
    debug!(config_path = %path.display(), "Using workspace configuration");
    Ok(builder.add_source(File::from(path).format(FileFormat::Toml).required(false)))
}
