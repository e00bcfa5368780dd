//! Privileged command execution.
//!
//! The channel never spawns processes itself. It hands lists of shell
//! commands to a [`CommandExecutor`], so tests can substitute a scripted
//! fake for the real `su` shell.

use crate::debug;
use crate::utils::exec::{Cmd, FilterRule};
use std::path::PathBuf;
use std::time::Duration;

/// Result of running one command list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub success: bool,
    /// `None` when the script did not run to completion.
    pub code: Option<i32>,
    /// Raw stdout. Kept as one string so file contents stay exact.
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: Option<i32>, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn stdout_lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.lines()
    }

    pub fn stderr_lines(&self) -> impl Iterator<Item = &str> {
        self.stderr.lines()
    }

    /// First stdout line, trimmed.
    pub fn first_line(&self) -> Option<&str> {
        self.stdout_lines().next().map(str::trim)
    }
}

/// Runs shell command lists with elevated privileges.
///
/// Commands run in order in one shell and stop at the first failure.
pub trait CommandExecutor: Send + Sync {
    fn run(&self, commands: &[String]) -> ExecOutput;
}

impl<E: CommandExecutor + ?Sized> CommandExecutor for &E {
    fn run(&self, commands: &[String]) -> ExecOutput {
        (**self).run(commands)
    }
}

/// Noise printed by Android's linker on every `su` invocation.
const SU_FILTER: FilterRule = FilterRule::new(&["WARNING: linker:"]);

/// Pipes command lists into a superuser shell.
#[derive(Debug, Clone)]
pub struct SuShell {
    shell: PathBuf,
    timeout: Duration,
}

impl SuShell {
    pub fn new(shell: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            shell: shell.into(),
            timeout,
        }
    }

    /// Resolve `shell` on `PATH`. `None` if no such binary exists.
    pub fn locate(shell: &str, timeout: Duration) -> Option<Self> {
        which::which(shell).ok().map(|path| Self::new(path, timeout))
    }

    pub fn shell(&self) -> &std::path::Path {
        &self.shell
    }

    fn script(commands: &[String]) -> String {
        let mut script = String::from("set -e\n");
        for command in commands {
            script.push_str(command);
            script.push('\n');
        }
        script
    }
}

impl CommandExecutor for SuShell {
    fn run(&self, commands: &[String]) -> ExecOutput {
        debug!("shell"; "{}", commands.join(" && "));

        let result = Cmd::new(&self.shell)
            .stdin(Self::script(commands))
            .timeout(self.timeout)
            .filter(&SU_FILTER)
            .output();

        match result {
            Ok(output) => ExecOutput {
                success: output.status.success(),
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            },
            Err(e) => ExecOutput::failed(None, format!("{e:#}")),
        }
    }
}

/// Quote `s` as one POSIX shell word.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("/data/graphics.xml"), "'/data/graphics.xml'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn test_script_is_set_e() {
        let script = SuShell::script(&["id -u".into(), "getenforce".into()]);
        assert_eq!(script, "set -e\nid -u\ngetenforce\n");
    }

    #[test]
    fn test_plain_sh_stands_in_for_su() {
        let shell = SuShell::new("sh", Duration::from_secs(5));
        let out = shell.run(&["echo one".into(), "echo two".into()]);
        assert!(out.success);
        assert_eq!(out.stdout, "one\ntwo\n");
        assert_eq!(out.first_line(), Some("one"));
    }

    #[test]
    fn test_stops_at_first_failure() {
        let shell = SuShell::new("sh", Duration::from_secs(5));
        let out = shell.run(&["false".into(), "echo unreachable".into()]);
        assert!(!out.success);
        assert_eq!(out.code, Some(1));
        assert!(out.stdout.is_empty());
    }

    #[test]
    fn test_missing_shell_reports_failure() {
        let shell = SuShell::new("/nonexistent/su", Duration::from_secs(1));
        let out = shell.run(&["id -u".into()]);
        assert!(!out.success);
        assert_eq!(out.code, None);
        assert!(!out.stderr.is_empty());
    }

    #[test]
    fn test_locate() {
        assert!(SuShell::locate("sh", Duration::from_secs(1)).is_some());
        assert!(SuShell::locate("definitely-not-a-shell-xyz", Duration::from_secs(1)).is_none());
    }
}
