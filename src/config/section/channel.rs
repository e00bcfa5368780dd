//! `[channel]` section configuration.
//!
//! How the privileged shell is reached and which strategies it may use.
//!
//! # Example
//!
//! ```toml
//! [channel]
//! shell = "su"                                   # Superuser shell binary
//! uid = 0                                        # User for the as-user read strategy
//! timeout_secs = 10                              # Per-script limit
//! security_label = "u:object_r:app_data_file:s0" # Label applied by relax-label
//! file_mode = "644"                              # Mode of written files
//! relax_label_on_write = false
//! create_dirs = true
//! read_strategies = ["direct", "as-user", "relax-label", "lower-enforcement"]
//! write_strategies = ["staged-copy", "staged-copy-permissive"]
//! # staging_dir = "/data/local/tmp"
//! # backup_dir = "/sdcard/Download"
//! ```

use crate::channel::{ReadStrategy, WriteStrategy};
use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const SHELL: FieldPath = FieldPath::new("channel.shell");
const TIMEOUT_SECS: FieldPath = FieldPath::new("channel.timeout_secs");
const SECURITY_LABEL: FieldPath = FieldPath::new("channel.security_label");
const FILE_MODE: FieldPath = FieldPath::new("channel.file_mode");
const READ_STRATEGIES: FieldPath = FieldPath::new("channel.read_strategies");
const WRITE_STRATEGIES: FieldPath = FieldPath::new("channel.write_strategies");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub shell: String,
    pub uid: u32,
    pub timeout_secs: u64,
    pub security_label: String,
    /// Octal mode passed to `chmod` after a write.
    pub file_mode: String,
    /// Also `chcon` the file after writing it.
    pub relax_label_on_write: bool,
    /// `mkdir -p` the parent directory before writing.
    pub create_dirs: bool,
    pub read_strategies: Vec<ReadStrategy>,
    pub write_strategies: Vec<WriteStrategy>,
    /// Where staged copies are created. Defaults to the system temp dir.
    pub staging_dir: Option<PathBuf>,
    /// Copy the old file here before overwriting it.
    pub backup_dir: Option<PathBuf>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            shell: "su".to_owned(),
            uid: 0,
            timeout_secs: 10,
            security_label: "u:object_r:app_data_file:s0".to_owned(),
            file_mode: "644".to_owned(),
            relax_label_on_write: false,
            create_dirs: true,
            read_strategies: ReadStrategy::ALL.to_vec(),
            write_strategies: WriteStrategy::ALL.to_vec(),
            staging_dir: None,
            backup_dir: None,
        }
    }
}

impl ChannelConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.shell.trim().is_empty() {
            diag.error(SHELL, "must not be empty");
        }
        if self.timeout_secs == 0 {
            diag.error(TIMEOUT_SECS, "must be at least 1");
        }

        let octal = (3..=4).contains(&self.file_mode.len())
            && self.file_mode.chars().all(|c| ('0'..='7').contains(&c));
        if !octal {
            diag.error_with_hint(
                FILE_MODE,
                format!("`{}` is not an octal mode", self.file_mode),
                "use three or four octal digits, e.g. \"644\"",
            );
        }

        let labels_used = self.relax_label_on_write
            || self.read_strategies.contains(&ReadStrategy::RelaxLabel);
        if labels_used && self.security_label.trim().is_empty() {
            diag.error(SECURITY_LABEL, "required by relax-label and relax_label_on_write");
        }

        if self.read_strategies.is_empty() {
            diag.error(READ_STRATEGIES, "at least one read strategy is required");
        }
        if self.write_strategies.is_empty() {
            diag.error(WRITE_STRATEGIES, "at least one write strategy is required");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_channel_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.channel, ChannelConfig::default());
        assert_eq!(config.channel.read_strategies.len(), 4);
        assert_eq!(config.channel.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_strategy_subset() {
        let config = test_parse_config(
            "[channel]\nread_strategies = [\"direct\", \"lower-enforcement\"]\nwrite_strategies = [\"staged-copy\"]",
        );
        assert_eq!(
            config.channel.read_strategies,
            [ReadStrategy::Direct, ReadStrategy::LowerEnforcement]
        );
        assert_eq!(config.channel.write_strategies, [WriteStrategy::StagedCopy]);
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let result: Result<crate::config::EngineConfig, _> =
            toml::from_str("[channel]\nread_strategies = [\"teleport\"]");
        assert!(result.is_err());
    }

    #[test]
    fn test_channel_validation() {
        let config = test_parse_config(
            "[channel]\nfile_mode = \"rw-r--r--\"\ntimeout_secs = 0\nwrite_strategies = []",
        );
        let message = config.validate().unwrap_err().to_string();
        assert!(message.contains("channel.file_mode"));
        assert!(message.contains("channel.timeout_secs"));
        assert!(message.contains("channel.write_strategies"));
        assert!(!message.contains("channel.read_strategies"));
    }
}
