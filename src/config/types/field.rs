//! Dotted config key used in diagnostics.

use owo_colors::OwoColorize;
use std::fmt;

/// Location of a value in `dynset.toml`, e.g. `channel.file_mode`.
///
/// Sections declare these as constants next to their `validate` so the
/// diagnostic text and the TOML key cannot drift apart.
///
/// ```ignore
/// const FILE_MODE: FieldPath = FieldPath::new("channel.file_mode");
/// diag.error(FILE_MODE, "not an octal mode");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath(&'static str);

impl FieldPath {
    #[inline]
    pub const fn new(path: &'static str) -> Self {
        Self(path)
    }

    #[inline]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }

    /// Leading table name.
    pub fn section(&self) -> &'static str {
        self.0.split('.').next().unwrap_or(self.0)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_args!("`{}`", self.0).bright_blue())
    }
}

impl AsRef<str> for FieldPath {
    fn as_ref(&self) -> &str {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_path_section() {
        assert_eq!(FieldPath::new("channel.file_mode").section(), "channel");
        assert_eq!(FieldPath::new("target").section(), "target");
        assert_eq!(FieldPath::new("log.verbose").as_str(), "log.verbose");
    }
}
