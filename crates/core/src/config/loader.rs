//! Config path resolution
//!
//! Every file the admin core reads or writes lives under one base directory,
//! normally the mod directory the server was started with.

use std::path::{Path, PathBuf};

use super::{ConfigError, ConfigResult};

/// Name of the core config file inside the base directory
pub const CONFIG_FILE_NAME: &str = "urtadmin.toml";

/// Fallback base directory when the host does not supply one.
///
/// The plugin library sits next to the server binary, so this is the
/// directory holding the running executable.
pub fn default_base_dir() -> ConfigResult<PathBuf> {
    let exe = std::env::current_exe().map_err(ConfigError::IoError)?;
    exe.parent()
        .map(PathBuf::from)
        .ok_or(ConfigError::NoBaseDirectory)
}

/// Returns the core config path.
///
/// Path: `<base_dir>/urtadmin.toml`
pub fn core_config_path(base_dir: &Path) -> PathBuf {
    base_dir.join(CONFIG_FILE_NAME)
}

/// Resolve a configured data file against the base directory.
///
/// Absolute paths and the SQLite `:memory:` name are returned unchanged.
pub fn resolve_data_path(base_dir: &Path, file: &str) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() || file == ":memory:" {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
