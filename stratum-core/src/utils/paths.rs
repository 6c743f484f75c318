//! XDG path resolution for Stratum, backed by `directories-next`.

use crate::error::{ConfigError, CoreError};
use directories_next::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

const QUALIFIER: &str = "org";
const ORGANIZATION: &str = "Stratum";
const APPLICATION: &str = "stratum";

/// Returns the application config directory, e.g. `~/.config/stratum`.
pub fn get_app_config_dir() -> Result<PathBuf, CoreError> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| {
            CoreError::Config(ConfigError::DirectoryUnavailable {
                dir_type: "App Config".to_string(),
            })
        })
}

/// Returns the application state directory, used to resolve relative log paths.
///
/// `ProjectDirs` has no state directory, so it is derived from `$XDG_STATE_HOME`
/// or `~/.local/state`.
pub fn get_app_state_dir() -> Result<PathBuf, CoreError> {
    let base = match std::env::var_os("XDG_STATE_HOME") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".local").join("state"))
            .ok_or_else(|| {
                CoreError::Config(ConfigError::DirectoryUnavailable {
                    dir_type: "State Base".to_string(),
                })
            })?,
    };
    Ok(base.join(APPLICATION))
}

/// Path of the user configuration file.
pub fn get_config_file_path() -> Result<PathBuf, CoreError> {
    Ok(get_app_config_dir()?.join("config.toml"))
}
