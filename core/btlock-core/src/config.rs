//! Runtime configuration.
//!
//! Sources, highest precedence first:
//! - command-line flags / environment (applied through [`Overrides`])
//! - `~/.config/btlock/config.toml` (or an explicit path)
//! - built-in defaults
//!
//! A missing file at the default location is not an error; a missing explicit
//! path or a malformed file is.

use crate::address::{HardwareAddress, DEFAULT_ADAPTER};
use crate::command::CommandSpec;
use crate::error::ConfigError;
use crate::lock::default_lock_commands;
use crate::resolver::{default_lister, MatchMode};
use crate::stream::default_monitor;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_RELATIVE_PATH: &str = "btlock/config.toml";

/// Contents of the config file. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub address: Option<HardwareAddress>,
    #[serde(default)]
    pub adapter: Option<String>,
    #[serde(default)]
    pub match_mode: Option<MatchMode>,
    #[serde(default)]
    pub lister: Option<CommandSpec>,
    #[serde(default)]
    pub monitor: Option<CommandSpec>,
    #[serde(default)]
    pub lock_commands: Option<Vec<CommandSpec>>,
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub address: Option<String>,
    pub adapter: Option<String>,
    pub exact_match: bool,
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub address: HardwareAddress,
    pub adapter: String,
    pub match_mode: MatchMode,
    pub lister: CommandSpec,
    pub monitor: CommandSpec,
    pub lock_commands: Vec<CommandSpec>,
}

impl FileConfig {
    /// The configured lock cascade. Needs no device address.
    pub fn lock_commands_or_default(&self) -> Vec<CommandSpec> {
        self.lock_commands
            .clone()
            .unwrap_or_else(default_lock_commands)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(DEFAULT_CONFIG_RELATIVE_PATH))
}

/// Reads the config file at `path`, which must exist. With `None`, reads the
/// default location if present and otherwise falls back to defaults.
pub fn load_file_config(path: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(FileConfig::default()),
        },
    };

    let content = fs_err::read_to_string(&config_path).map_err(|source| ConfigError::Read {
        path: config_path.clone(),
        source,
    })?;
    toml::from_str::<FileConfig>(&content).map_err(|source| ConfigError::Parse {
        path: config_path,
        source,
    })
}

impl Config {
    pub fn resolve(file: FileConfig, overrides: Overrides) -> Result<Self, ConfigError> {
        let lock_commands = file.lock_commands_or_default();

        let address = match overrides.address {
            Some(raw) => raw.parse::<HardwareAddress>()?,
            None => file.address.ok_or(ConfigError::MissingAddress)?,
        };

        let match_mode = if overrides.exact_match {
            MatchMode::Exact
        } else {
            file.match_mode.unwrap_or_default()
        };

        Ok(Self {
            address,
            adapter: overrides
                .adapter
                .or(file.adapter)
                .unwrap_or_else(|| DEFAULT_ADAPTER.to_string()),
            match_mode,
            lister: file.lister.unwrap_or_else(default_lister),
            monitor: file.monitor.unwrap_or_else(default_monitor),
            lock_commands,
        })
    }

    /// Loads the file at `path` (or the default location) and applies `overrides`.
    pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<Self, ConfigError> {
        Self::resolve(load_file_config(path)?, overrides)
    }
}
