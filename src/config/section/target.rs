//! `[target]` section configuration.
//!
//! Which file to edit and what its root element looks like.
//!
//! # Example
//!
//! ```toml
//! [target]
//! path = "/data/user/0/com.netflix.NGP.Kamo/files/graphics.xml"
//! package = "com.netflix.NGP.Kamo"          # Owning app, for diagnostics
//! language_path = "/storage/emulated/0/Android/data/com.netflix.NGP.Kamo/files/netflix.dat"
//! language_key = "LANGUAGE"
//! root_tag = "rage__GraphicsOptions"        # Used for the built-in default document
//! root_version = "83.0"
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const PACKAGE: &str = "com.netflix.NGP.Kamo";

const PATH: FieldPath = FieldPath::new("target.path");
const LANGUAGE_KEY: FieldPath = FieldPath::new("target.language_key");
const ROOT_TAG: FieldPath = FieldPath::new("target.root_tag");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Settings document to edit.
    pub path: PathBuf,

    /// Package that owns the file. Only used by `doctor`.
    pub package: Option<String>,

    /// `KEY=VALUE` file holding the language selection.
    pub language_path: PathBuf,

    /// Key of the language line in `language_path`.
    pub language_key: String,

    /// Root element of the built-in default document.
    pub root_tag: String,

    /// `v` attribute of the built-in default document.
    pub root_version: Option<String>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(format!("/data/user/0/{PACKAGE}/files/graphics.xml")),
            package: Some(PACKAGE.to_owned()),
            language_path: PathBuf::from(format!(
                "/storage/emulated/0/Android/data/{PACKAGE}/files/netflix.dat"
            )),
            language_key: "LANGUAGE".to_owned(),
            root_tag: crate::settings::DEFAULT_ROOT_TAG.to_owned(),
            root_version: Some(crate::settings::DEFAULT_ROOT_VERSION.to_owned()),
        }
    }
}

impl TargetConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.path.as_os_str().is_empty() {
            diag.error(PATH, "must not be empty");
        } else if self.path.is_relative() {
            diag.error_with_hint(
                PATH,
                format!("must be absolute on the device: {}", self.path.display()),
                "paths are passed to the privileged shell as-is",
            );
        }

        if self.language_key.is_empty() || self.language_key.contains(['=', '\n']) {
            diag.error(LANGUAGE_KEY, "must be non-empty and contain no `=` or newline");
        }

        let valid_tag = self
            .root_tag
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && self
                .root_tag
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'));
        if !valid_tag {
            diag.error(ROOT_TAG, format!("`{}` is not an XML element name", self.root_tag));
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_target_defaults() {
        let config = test_parse_config("");
        assert!(config.target.path.ends_with("files/graphics.xml"));
        assert_eq!(config.target.language_key, "LANGUAGE");
        assert_eq!(config.target.root_tag, "rage__GraphicsOptions");
        assert_eq!(config.target.root_version.as_deref(), Some("83.0"));
    }

    #[test]
    fn test_target_override() {
        let config = test_parse_config(
            "[target]\npath = \"/data/local/tmp/options.xml\"\nroot_tag = \"Options\"",
        );
        assert_eq!(config.target.path.to_str(), Some("/data/local/tmp/options.xml"));
        assert_eq!(config.target.root_tag, "Options");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_target_validation() {
        let config = test_parse_config(
            "[target]\npath = \"relative.xml\"\nlanguage_key = \"A=B\"\nroot_tag = \"1bad\"",
        );
        let err = config.validate().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("target.path"));
        assert!(message.contains("target.language_key"));
        assert!(message.contains("target.root_tag"));
    }
}
