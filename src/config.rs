//! Configuration loading for claude-approve
//!
//! Supports TOML configuration with built-in default rules.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::rules::defaults::{default_allow, default_deny, default_wrappers};
use crate::rules::{CompileError, RuleSet, RuleSpec};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// General configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable audit logging
    pub audit_log: bool,

    /// Path to audit log file
    pub audit_path: Option<String>,

    /// Answer "ask" instead of staying silent when a command is not approved
    pub explicit_ask: bool,

    /// Stderr log level (off, error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            audit_log: true,
            audit_path: Some("~/.claude/approve/audit.jsonl".to_string()),
            explicit_ask: false,
            log_level: "warn".to_string(),
        }
    }
}

/// Main configuration structure. A rule array present in the file replaces
/// the built-in list of the same kind.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub wrappers: Vec<RuleSpec>,
    pub deny: Vec<RuleSpec>,
    pub allow: Vec<RuleSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            wrappers: default_wrappers(),
            deny: default_deny(),
            allow: default_allow(),
        }
    }
}

impl Config {
    /// Standard config locations, most specific first
    pub fn search_paths() -> Vec<PathBuf> {
        [
            // User-specific config
            dirs::home_dir().map(|p| p.join(".claude/approve/config.toml")),
            // System-wide config
            Some(PathBuf::from("/etc/claude-approve/config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Load the first config file found in the standard locations, or the
    /// built-in defaults when there is none. A file that exists but cannot be
    /// read or parsed is an error: falling back would widen the allow list.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_first(&Self::search_paths())
    }

    /// Load the first of `paths` that exists
    pub fn load_first(paths: &[PathBuf]) -> Result<Self, ConfigError> {
        match paths.iter().find(|path| path.exists()) {
            Some(path) => {
                let config = Self::load_from(path)?;
                log::debug!("loaded config from {}", path.display());
                Ok(config)
            }
            None => Ok(Config::default()),
        }
    }

    /// Load from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Compile the rule lists into an immutable rule set
    pub fn compile(&self) -> Result<RuleSet, CompileError> {
        RuleSet::compile(&self.wrappers, &self.allow, &self.deny)
    }

    /// Expand ~ in path strings
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    /// Get the audit log path (expanded)
    pub fn audit_path(&self) -> Option<PathBuf> {
        self.general.audit_path.as_deref().map(Self::expand_path)
    }

    /// Configured log level, `warn` when unrecognised
    pub fn log_level(&self) -> log::LevelFilter {
        self.general
            .log_level
            .parse()
            .unwrap_or(log::LevelFilter::Warn)
    }
}
