use crate::errors::Result;
use crate::mask::DEFAULT_PLACEHOLDER;
use crate::planner::{MatchScope, Padding};
use crate::preview::PreviewFormat;
use serde::Deserialize;
use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};

/// File name looked up in the PATH given to a command: the folder itself with
/// `--direct`, otherwise the parent the folder is chosen from.
pub const LOCAL_CONFIG_NAME: &str = ".seqren.yaml";

/// Settings that can be fixed in a YAML file instead of passed on every run.
///
/// Every field is optional in the file; missing ones fall back to the defaults below.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// The token that marks the sequence number in masks.
    pub placeholder: String,
    /// Whether masks see the whole file name or only its stem.
    pub scope: MatchScope,
    /// Zero-padding for numeric tokens.
    pub padding: Padding,
    /// Include dot-files when listing the target folder.
    pub include_hidden: bool,
    /// Text listings at or above this length are abbreviated.
    pub preview_limit: usize,
    pub format: PreviewFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            scope: MatchScope::default(),
            padding: Padding::default(),
            include_hidden: false,
            preview_limit: 30,
            format: PreviewFormat::Text,
        }
    }
}

/// A utility for locating and loading the configuration file.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Finds the configuration file to use, if any.
    ///
    /// The search order is:
    /// 1. The `explicit` path (from `--config` or `SEQREN_CONFIG`). It must exist.
    /// 2. `.seqren.yaml` in `working_dir`.
    /// 3. `seqren/config.yaml` under `XDG_CONFIG_HOME`, or the platform config directory.
    ///
    /// Returns `Ok(None)` when no file is found and none was requested.
    pub fn find_config(explicit: Option<&Path>, working_dir: &Path) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.is_file() {
                return Ok(Some(path.to_path_buf()));
            }
            let in_working_dir = working_dir.join(path);
            if path.is_relative() && in_working_dir.is_file() {
                return Ok(Some(in_working_dir));
            }
            return Err(format!(
                "Config file '{}' not found. Searched in:\n  - {}\n  - {}",
                path.display(),
                path.display(),
                in_working_dir.display()
            )
            .into());
        }

        let local = working_dir.join(LOCAL_CONFIG_NAME);
        if local.is_file() {
            return Ok(Some(local));
        }

        if let Some(global) = Self::global_config_path() {
            if global.is_file() {
                return Ok(Some(global));
            }
        }

        Ok(None)
    }

    fn global_config_path() -> Option<PathBuf> {
        env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(dirs::config_dir)
            .map(|dir| dir.join("seqren").join("config.yaml"))
    }

    /// Loads a `Config` from a YAML file.
    pub fn load(path: &Path) -> Result<Config> {
        let file = File::open(path)?;
        let config: Config = serde_yaml::from_reader(file)?;
        if config.placeholder.is_empty() {
            return Err(format!("{}: placeholder cannot be empty", path.display()).into());
        }
        Ok(config)
    }

    /// Finds and loads the configuration, falling back to defaults when there is no file.
    pub fn resolve(explicit: Option<&Path>, working_dir: &Path) -> Result<Config> {
        match Self::find_config(explicit, working_dir)? {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::load(&path)
            }
            None => Ok(Config::default()),
        }
    }
}
