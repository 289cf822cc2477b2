//! Configuration file discovery and loading

use std::path::{Path, PathBuf};

use logscope_types::Config;
use thiserror::Error;

/// File name looked up in the working and home directories
const DOTFILE: &str = ".logscope.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Where configuration came from
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: Config,
    /// `None` when built-in defaults are used
    pub path: Option<PathBuf>,
}

/// Candidate files, highest precedence first
///
/// An explicit path replaces the search entirely.
pub fn search_paths(explicit: Option<&Path>) -> Vec<PathBuf> {
    if let Some(path) = explicit {
        return vec![path.to_path_buf()];
    }

    let mut paths = vec![PathBuf::from(DOTFILE)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("logscope").join("config.toml"));
    }
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(DOTFILE));
    }
    paths
}

/// Load the first existing file among `paths`, or the defaults
///
/// A file that exists but cannot be read or parsed is an error; an
/// explicitly requested file that does not exist is reported the same way.
pub fn load_from(paths: &[PathBuf], explicit: bool) -> Result<LoadedConfig, ConfigError> {
    for path in paths {
        if !explicit && !path.is_file() {
            continue;
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;

        tracing::debug!(path = %path.display(), "Loaded configuration");
        return Ok(LoadedConfig {
            config,
            path: Some(path.clone()),
        });
    }

    Ok(LoadedConfig {
        config: Config::default(),
        path: None,
    })
}

/// Resolve configuration the way the command line asks for it
pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    load_from(&search_paths(explicit), explicit.is_some())
}
