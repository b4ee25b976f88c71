//! linewise configuration
//!
//! User-level settings read from TOML, with defaults for every field.
//!
//! # Configuration hierarchy
//!
//! ```text
//! Priority (high -> low):
//! 1. CLI arguments
//! 2. --config <file>
//! 3. User-level ($XDG_CONFIG_HOME/linewise/config.toml or ~/.config/linewise/config.toml)
//! 4. Default values
//! ```
//!
//! # Usage
//!
//! ```rust
//! use linewise::util::config::{parse, UserConfig};
//!
//! // Missing sections and fields take their defaults
//! let config: UserConfig = parse("[repl]\nvi_mode = true").unwrap();
//! assert!(config.repl.vi_mode);
//! assert_eq!(config.repl.result_prefix, "res");
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backends::dev::repl::engine::{EvaluatorConfig, WrapperMode};
use crate::backends::dev::repl::line::LineConfig;
use crate::util::logger::LogLevel;

/// User-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct UserConfig {
    /// REPL settings
    #[serde(default)]
    pub repl: ReplConfig,
    /// Log settings
    #[serde(default)]
    pub log: LogConfig,
}

/// REPL configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReplConfig {
    /// Prompt string
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// Prompt while input is incomplete
    #[serde(default = "default_continuation_prompt")]
    pub continuation_prompt: String,
    /// History file path; the data directory is used when unset
    #[serde(default)]
    pub history_file: Option<PathBuf>,
    /// History size
    #[serde(default = "default_history_size")]
    pub history_size: usize,
    /// Vi key bindings
    #[serde(default)]
    pub vi_mode: bool,
    /// Colour errors and notices
    #[serde(default = "default_colors")]
    pub colors: bool,
    /// How units hold their members
    #[serde(default)]
    pub wrapper_mode: WrapperMode,
    /// Base name of synthetic results
    #[serde(default = "default_result_prefix")]
    pub result_prefix: String,
    /// Imports run before the first prompt
    #[serde(default)]
    pub auto_imports: Vec<String>,
}

fn default_prompt() -> String {
    "scala> ".to_string()
}

fn default_continuation_prompt() -> String {
    "     | ".to_string()
}

fn default_history_size() -> usize {
    1000
}

fn default_colors() -> bool {
    true
}

fn default_result_prefix() -> String {
    "res".to_string()
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            continuation_prompt: default_continuation_prompt(),
            history_file: None,
            history_size: default_history_size(),
            vi_mode: false,
            colors: true,
            wrapper_mode: WrapperMode::Object,
            result_prefix: default_result_prefix(),
            auto_imports: Vec::new(),
        }
    }
}

impl ReplConfig {
    /// Settings for the evaluation engine
    pub fn evaluator_config(&self) -> EvaluatorConfig {
        EvaluatorConfig {
            result_prefix: self.result_prefix.clone(),
            wrapper_mode: self.wrapper_mode,
        }
    }

    /// Settings for the line editor
    pub fn line_config(&self) -> LineConfig {
        LineConfig {
            prompt: self.prompt.clone(),
            continuation_prompt: self.continuation_prompt.clone(),
            vi_mode: self.vi_mode,
            history_size: self.history_size,
            colors: self.colors,
        }
    }

    /// Configured history file, else `history.jsonl` in the data directory
    pub fn history_path(&self) -> Option<PathBuf> {
        self.history_file
            .clone()
            .or_else(|| get_data_dir().map(|dir| dir.join("history.jsonl")))
    }
}

/// Log configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    /// `debug`, `info`, `warn` or `error`
    #[serde(default)]
    pub level: LogLevel,
}

/// Get the user config directory
pub fn get_config_dir() -> Option<PathBuf> {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config).join("linewise"));
    }

    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home).join(".config").join("linewise"));
    }

    // On Windows, try %APPDATA%
    if let Ok(appdata) = std::env::var("APPDATA") {
        return Some(PathBuf::from(appdata).join("linewise"));
    }

    None
}

/// Get the user data directory, where history is kept by default
pub fn get_data_dir() -> Option<PathBuf> {
    if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
        return Some(PathBuf::from(xdg_data).join("linewise"));
    }

    if let Ok(home) = std::env::var("HOME") {
        return Some(
            PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("linewise"),
        );
    }

    get_config_dir()
}

/// Get the user config file path
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.toml"))
}

/// Load user-level configuration
/// Returns default config if file doesn't exist
pub fn load_user_config() -> Result<UserConfig, ConfigError> {
    match get_config_path() {
        Some(path) if path.exists() => load_from(&path),
        _ => Ok(UserConfig::default()),
    }
}

/// Load configuration from an explicit file, which must exist
pub fn load_from(path: &Path) -> Result<UserConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("loaded config from {}", path.display());
    Ok(config)
}

/// Parse configuration text
pub fn parse(content: &str) -> Result<UserConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
