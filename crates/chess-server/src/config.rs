//! Configuration file loading for the chess server.
//!
//! Settings are read from `chess-server.toml` in the working directory.
//! Every field has a default, so a missing file or a partial file is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when loading the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// How the machine opponent picks its moves.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BotMode {
    /// Full depth-limited traversal, branch picked by the scorer.
    #[default]
    Tree,
    /// Random origin with a legal move, random destination.
    Random,
}

/// Server settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Plies explored by the tree search. Defaults to 5.
    #[serde(default = "default_search_depth")]
    pub search_depth: u32,
    /// Defaults to the tree search.
    #[serde(default)]
    pub bot_mode: BotMode,
    /// Debounce delay before a scheduled bot move fires. Defaults to 3000.
    #[serde(default = "default_bot_move_delay_ms")]
    pub bot_move_delay_ms: u64,
    /// Period of the idle-lock sweep. Defaults to 600.
    #[serde(default = "default_lock_sweep_interval_secs")]
    pub lock_sweep_interval_secs: u64,
    /// Locks unused for longer than this are evicted. Defaults to 3600.
    #[serde(default = "default_lock_idle_threshold_secs")]
    pub lock_idle_threshold_secs: u64,
    /// Maximum number of bot moves computed at once. Defaults to 10.
    #[serde(default = "default_scheduler_workers")]
    pub scheduler_workers: usize,
    /// Filter used when `RUST_LOG` is not set. Defaults to "info".
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Plies played by the self-play smoke game of the binary. Defaults to 12.
    #[serde(default = "default_self_play_moves")]
    pub self_play_moves: u32,
}

fn default_search_depth() -> u32 {
    chess_engine::DEFAULT_DEPTH
}

fn default_bot_move_delay_ms() -> u64 {
    3000
}

fn default_lock_sweep_interval_secs() -> u64 {
    600
}

fn default_lock_idle_threshold_secs() -> u64 {
    3600
}

fn default_scheduler_workers() -> usize {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_self_play_moves() -> u32 {
    12
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            search_depth: default_search_depth(),
            bot_mode: BotMode::default(),
            bot_move_delay_ms: default_bot_move_delay_ms(),
            lock_sweep_interval_secs: default_lock_sweep_interval_secs(),
            lock_idle_threshold_secs: default_lock_idle_threshold_secs(),
            scheduler_workers: default_scheduler_workers(),
            log_level: default_log_level(),
            self_play_moves: default_self_play_moves(),
        }
    }
}

impl ServerConfig {
    /// Loads the configuration from [`Self::config_path()`], falling back to
    /// defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file exists but cannot be read,
    /// or [`ConfigError::ParseError`] if the file contains invalid TOML.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Same as [`Self::load`] for an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns `chess-server.toml` in the current working directory.
    pub fn config_path() -> PathBuf {
        PathBuf::from("chess-server.toml")
    }

    pub fn bot_move_delay(&self) -> Duration {
        Duration::from_millis(self.bot_move_delay_ms)
    }

    pub fn lock_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.lock_sweep_interval_secs)
    }

    pub fn lock_idle_threshold(&self) -> Duration {
        Duration::from_secs(self.lock_idle_threshold_secs)
    }
}
