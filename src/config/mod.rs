//! Engine configuration from `dynset.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # One module per TOML table
//! │   ├── channel    # [channel]
//! │   ├── log        # [log]
//! │   └── target     # [target]
//! ├── types/         # ConfigError, ConfigDiagnostics, FieldPath
//! ├── util.rs        # Config discovery, path expansion
//! └── mod.rs         # EngineConfig (this file)
//! ```
//!
//! The file is optional. Without one every section takes its defaults, which
//! point at the stock game install.

pub mod section;
pub mod types;
mod util;

pub use section::{ChannelConfig, LogConfig, TargetConfig};
pub use types::{ConfigDiagnostic, ConfigDiagnostics, ConfigError, FieldPath};
pub use util::{expand_path, find_config_file};

use crate::log;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name searched for when no explicit path is given.
pub const CONFIG_FILE: &str = "dynset.toml";

// ============================================================================
// root configuration
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Where this config was loaded from, `None` for built-in defaults.
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    #[serde(default)]
    pub target: TargetConfig,

    #[serde(default)]
    pub channel: ChannelConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl EngineConfig {
    /// Load the configuration.
    ///
    /// An explicit path must exist. Otherwise `dynset.toml` is searched
    /// upward from the working directory, falling back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) if !path.is_file() => {
                return Err(ConfigError::Validation(format!(
                    "config file not found: `{}`",
                    path.display()
                ))
                .into());
            }
            Some(path) => Some(path.to_path_buf()),
            None => {
                let cwd = std::env::current_dir()
                    .context("failed to get current working directory")?;
                find_config_file(&cwd, CONFIG_FILE)
            }
        };

        let mut config = match &path {
            Some(path) => Self::from_path(path)?,
            None => {
                crate::debug!("config"; "no {CONFIG_FILE} found, using defaults");
                Self::default()
            }
        };
        config.config_path = path;
        config.normalize_paths();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Parse a file, warning about keys that do not map to any setting.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        if !ignored.is_empty() {
            log!("warning"; "unknown fields in {}, ignoring:", path.display());
            for field in &ignored {
                eprintln!("- {field}");
            }
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Expand `~` and environment variables in host-side paths.
    ///
    /// Device paths under `[target]` are left alone; they are resolved by the
    /// privileged shell, not by this process.
    fn normalize_paths(&mut self) {
        if let Some(dir) = self.channel.staging_dir.take() {
            self.channel.staging_dir = Some(expand_path(&dir));
        }
        if let Some(dir) = self.channel.backup_dir.take() {
            self.channel.backup_dir = Some(expand_path(&dir));
        }
    }

    /// Validate every section, reporting all problems at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.target.validate(&mut diag);
        self.channel.validate(&mut diag);

        if self.channel.uid != 0
            && !self
                .channel
                .read_strategies
                .contains(&crate::channel::ReadStrategy::AsUser)
        {
            diag.warn("channel.uid is set but the as-user strategy is disabled");
        }

        diag.print_warnings();
        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> EngineConfig {
    let (parsed, ignored) = EngineConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
