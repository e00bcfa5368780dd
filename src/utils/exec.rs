//! External command execution.
//!
//! Builder-based API for running a program with a script piped to stdin,
//! captured output and an optional wall-clock limit.
//!
//! # Examples
//!
//! ```ignore
//! use crate::utils::exec::Cmd;
//!
//! // Pipe a script into a shell and give up after ten seconds
//! let output = Cmd::new("su")
//!     .stdin("set -e\nid -u\n")
//!     .timeout(Duration::from_secs(10))
//!     .output()?;
//! ```

use crate::debug;
use anyhow::{Context, Result, bail};
use regex::Regex;
use std::{
    ffi::{OsStr, OsString},
    io::{self, Read, Write},
    process::{Child, Command, ExitStatus, Output, Stdio},
    sync::OnceLock,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

// ============================================================================
// Builder API
// ============================================================================

/// Command builder for external process execution.
#[derive(Default)]
pub struct Cmd {
    program: OsString,
    stdin_data: Option<Vec<u8>>,
    timeout: Option<Duration>,
    filter: Option<&'static FilterRule>,
}

impl Cmd {
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Data to pipe to the process. Without it stdin is `/dev/null`.
    pub fn stdin<D: AsRef<[u8]>>(mut self, data: D) -> Self {
        self.stdin_data = Some(data.as_ref().to_vec());
        self
    }

    /// Kill the process if it has not exited after `limit`.
    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    /// Filter applied when echoing stderr in verbose mode.
    pub fn filter(mut self, filter: &'static FilterRule) -> Self {
        self.filter = Some(filter);
        self
    }

    fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    /// Run to completion and capture output.
    ///
    /// A non-zero exit status is not an error here; inspect `status`.
    /// Spawn failures and timeouts are.
    pub fn output(self) -> Result<Output> {
        let name = self.program_name();
        let filter = self.filter.unwrap_or(&EMPTY_FILTER);

        let mut cmd = Command::new(&self.program);
        cmd.stdin(if self.stdin_data.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn `{name}`"))?;

        // Feed stdin from its own thread so a chatty child cannot block us.
        let writer = match (child.stdin.take(), self.stdin_data) {
            (Some(mut stdin), Some(data)) => Some(thread::spawn(move || stdin.write_all(&data))),
            _ => None,
        };
        let stdout = child.stdout.take().map(spawn_reader);
        let stderr = child.stderr.take().map(spawn_reader);

        let status = match self.timeout {
            Some(limit) => wait_with_timeout(&mut child, limit)
                .with_context(|| format!("Failed to wait for `{name}`"))?,
            None => Some(
                child
                    .wait()
                    .with_context(|| format!("Failed to wait for `{name}`"))?,
            ),
        };

        if let Some(Ok(Err(e))) = writer.map(JoinHandle::join) {
            debug!("exec"; "`{}` closed stdin early: {}", name, e);
        }
        let stdout = collect(stdout);
        let stderr = collect(stderr);

        let Some(status) = status else {
            bail!(
                "Command `{name}` timed out after {}s",
                self.timeout.unwrap_or_default().as_secs_f32()
            );
        };

        filter.log(&name, String::from_utf8_lossy(&stderr).trim());
        Ok(Output {
            status,
            stdout,
            stderr,
        })
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut source: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = source.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

/// `Ok(None)` when the limit elapsed and the child was killed.
fn wait_with_timeout(child: &mut Child, limit: Duration) -> io::Result<Option<ExitStatus>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= limit {
            child.kill().ok();
            child.wait().ok();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

// ============================================================================
// Output Filtering
// ============================================================================

/// Filter rule for command output logging.
///
/// Used to reduce noise by skipping known warnings or irrelevant messages.
pub struct FilterRule {
    /// Prefixes to skip when logging output.
    pub skip_prefixes: &'static [&'static str],
}

impl FilterRule {
    pub const fn new(skip_prefixes: &'static [&'static str]) -> Self {
        Self { skip_prefixes }
    }

    fn should_skip(&self, line: &str) -> bool {
        line.is_empty() || self.skip_prefixes.iter().any(|p| line.starts_with(p))
    }

    /// Echo the lines that pass the filter in verbose mode.
    pub fn log(&self, name: &str, output: &str) {
        let lines: Vec<_> = output
            .lines()
            .filter(|line| {
                let plain = strip_ansi(line);
                !self.should_skip(plain.trim())
            })
            .collect();

        if !lines.is_empty() {
            debug!(name; "{}", lines.join("\n"));
        }
    }
}

/// Empty filter (no skipping).
pub const EMPTY_FILTER: FilterRule = FilterRule::new(&[]);

/// Strip ANSI escape codes from string.
fn strip_ansi(s: &str) -> std::borrow::Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap());
    re.replace_all(s, "")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_rule() {
        let filter = FilterRule::new(&["WARNING: linker:"]);
        assert!(filter.should_skip("WARNING: linker: unused DT entry"));
        assert!(!filter.should_skip("Permission denied"));
        assert!(filter.should_skip(""));
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[31mRed\x1b[0m"), "Red");
        assert_eq!(strip_ansi("Plain text"), "Plain text");
    }

    #[test]
    fn test_stdin_pipe() {
        let output = Cmd::new("cat").stdin(b"test data").output().unwrap();
        assert!(output.status.success());
        assert_eq!(output.stdout, b"test data");
    }

    #[test]
    fn test_failure_is_not_an_error() {
        let output = Cmd::new("sh")
            .stdin("echo oops >&2\nexit 3\n")
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(output.stderr, b"oops\n");
    }

    #[test]
    fn test_timeout_kills_child() {
        let start = Instant::now();
        let result = Cmd::new("sh")
            .stdin("exec sleep 5\n")
            .timeout(Duration::from_millis(100))
            .output();
        assert!(result.is_err());
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_spawn_failure() {
        assert!(Cmd::new("definitely-not-a-real-program-xyz").output().is_err());
    }
}
