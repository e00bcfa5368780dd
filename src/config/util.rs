//! Configuration file discovery.

use std::path::{Path, PathBuf};

/// Find `name` in `start` or the nearest ancestor that has it.
///
/// ```text
/// /home/user/work/device/   ← start
/// /home/user/dynset.toml    ← found
/// ```
pub fn find_config_file(start: &Path, name: &str) -> Option<PathBuf> {
    let mut current = start;
    loop {
        let candidate = current.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
        current = current.parent()?;
    }
}

/// Expand a leading `~` and `$VAR`s. Unresolvable input is returned as-is.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_file_walks_up() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("a/dynset.toml"), "").unwrap();

        let found = find_config_file(&nested, "dynset.toml").unwrap();
        assert_eq!(found, dir.path().join("a/dynset.toml"));
    }

    #[test]
    fn test_find_config_file_prefers_nearest() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("dynset.toml"), "").unwrap();
        fs::write(nested.join("dynset.toml"), "").unwrap();

        assert_eq!(
            find_config_file(&nested, "dynset.toml"),
            Some(nested.join("dynset.toml"))
        );
    }

    #[test]
    fn test_find_config_file_ignores_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("unlikely-name.toml")).unwrap();
        assert_eq!(find_config_file(dir.path(), "unlikely-name.toml"), None);
    }

    #[test]
    fn test_expand_path() {
        let plain = Path::new("/data/local/tmp");
        assert_eq!(expand_path(plain), plain);

        if let Some(home) = std::env::var_os("HOME") {
            let expanded = expand_path(Path::new("~/backups"));
            assert_eq!(expanded, PathBuf::from(home).join("backups"));
        }
    }
}
