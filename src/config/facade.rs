//! Loading entry points: layered sources, deserialized into `DirsnapConfig`.

use super::merge::merge_policy;
use super::sources::{environment, global_file, workspace_file};
use super::DirsnapConfig;
use config::{ConfigError, File, FileFormat};
use std::path::{Path, PathBuf};

/// Configuration loader
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a traversal root.
    ///
    /// Precedence: defaults, global file, `<root>/dirsnap.toml`, environment.
    /// `snapshot.root` defaults to `root`.
    pub fn load(root: &Path) -> Result<DirsnapConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?
            .set_default("snapshot.root", root.to_string_lossy().into_owned())?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, root)?;
        let builder = environment::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }

    /// Load from an explicit file; global and workspace files are skipped,
    /// the environment still applies.
    pub fn load_from_file(path: &Path) -> Result<DirsnapConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?
            .add_source(File::from(path).format(FileFormat::Toml).required(true));
        let builder = environment::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }

    /// Where the global configuration file is looked up
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    /// Where the workspace configuration file is looked up for `root`
    pub fn workspace_config_path(root: &Path) -> PathBuf {
        workspace_file::workspace_config_path(root)
    }
}
