//! `[log]` section configuration.
//!
//! ```toml
//! [log]
//! verbose = false   # Same as passing --verbose
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Print strategy attempts, shell commands and parser notes.
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_log_section() {
        assert!(!test_parse_config("").log.verbose);
        assert!(test_parse_config("[log]\nverbose = true").log.verbose);
    }
}
