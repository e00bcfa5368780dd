//! On-demand troubleshooting report.

use super::enforce::EnforcementMode;
use super::executor::{CommandExecutor, shell_quote};
use super::{PrivilegedChannel, quote_path};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Ordered key/value facts plus the warnings derived from them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnosis {
    pub entries: Vec<(String, String)>,
    pub warnings: Vec<String>,
}

impl Diagnosis {
    fn entry(&mut self, key: &str, value: impl ToString) {
        self.entries.push((key.to_owned(), value.to_string()));
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in &self.entries {
            let value = value.replace('\n', &format!("\n{:width$}  ", ""));
            writeln!(f, "{key:width$}  {value}")?;
        }
        for warning in &self.warnings {
            writeln!(f, "warning: {warning}")?;
        }
        Ok(())
    }
}

impl<E: CommandExecutor> PrivilegedChannel<E> {
    /// Collect privilege, enforcement, presence and label information about
    /// `path`, and whether `package` is installed and running.
    pub fn diagnose(&self, path: &Path, package: Option<&str>) -> Diagnosis {
        let mut diag = Diagnosis::default();

        let id = self.exec.run(&["id -u".to_owned()]);
        diag.entry("uid", id.first_line().unwrap_or("unknown"));

        match EnforcementMode::query(&self.exec) {
            Some(mode) => {
                diag.entry("selinux", mode);
                if mode == EnforcementMode::Enforcing {
                    diag.warn("SELinux is enforcing and may block access to app data");
                }
            }
            None => diag.entry("selinux", "unknown"),
        }

        let exists = self.exists(path);
        diag.entry("target", path.display());
        diag.entry("exists", exists);
        if exists {
            diag.entry("listing", self.probe(format!("ls -la {}", quote_path(path))));
            diag.entry("label", self.probe(format!("ls -Z {}", quote_path(path))));
        } else {
            diag.warn(format!("{} does not exist", path.display()));
        }
        if let Some(dir) = path.parent() {
            diag.entry("directory", self.probe(format!("ls -ld {}", quote_path(dir))));
        }

        if let Some(package) = package {
            let listed = self.exec.run(&[format!("pm list packages {}", shell_quote(package))]);
            let needle = format!("package:{package}");
            let installed = listed.success && listed.stdout_lines().any(|l| l.trim() == needle);
            diag.entry("installed", installed);
            if !installed {
                diag.warn(format!("{package} is not installed"));
            }

            let pids = self.exec.run(&[format!("pidof {}", shell_quote(package))]);
            let running = pids.success && !pids.stdout.trim().is_empty();
            diag.entry("running", running);
            if running {
                diag.warn(format!("{package} is running and may overwrite the file"));
            }
        }

        diag
    }

    /// Trimmed stdout, or why it could not be obtained.
    fn probe(&self, command: String) -> String {
        let out = self.exec.run(&[command]);
        if out.success {
            out.stdout.trim().to_owned()
        } else if let Some(line) = out.stderr_lines().next() {
            format!("unavailable ({line})")
        } else {
            "unavailable".to_owned()
        }
    }
}
