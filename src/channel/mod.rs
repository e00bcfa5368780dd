//! Privileged file channel.
//!
//! Reads and writes files owned by another app through a superuser shell.
//! Every operation walks a chain of strategies until one works, and every
//! write is read back and compared before it counts as done.
//!
//! ```text
//! read:  direct → as-user → relax-label → lower-enforcement
//! write: stage (tempfile) → backup? → staged-copy → staged-copy-permissive
//!        → verify (full read chain, trim_end compare)
//! ```
//!
//! The channel is an explicit value built by [`PrivilegedChannel::open`]. It
//! holds no global state; share it behind an `Arc` if several threads need it.

mod diagnose;
mod enforce;
mod error;
mod executor;
mod strategy;


pub use diagnose::Diagnosis;
pub use enforce::{EnforcementGuard, EnforcementMode};
pub use error::{AccessError, ChannelError};
pub use executor::{CommandExecutor, ExecOutput, SuShell, shell_quote};
pub use strategy::{Attempt, AttemptReport, Operation, ReadStrategy, WriteStrategy};

use crate::config::ChannelConfig;
use crate::utils::hash;
use crate::{debug, log};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::NamedTempFile;

/// Elevated file access with fallback strategies and verified writes.
pub struct PrivilegedChannel<E: CommandExecutor> {
    exec: E,
    config: ChannelConfig,
    last_report: Mutex<Option<AttemptReport>>,
    /// One lock per target path; writes to the same file are serialized.
    write_locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl<E: CommandExecutor> PrivilegedChannel<E> {
    /// Check privilege once and build the channel.
    pub fn open(exec: E, config: ChannelConfig) -> Result<Self, AccessError> {
        let out = exec.run(&["id -u".to_owned()]);
        match out.first_line() {
            Some("0") if out.success => {}
            Some(uid) if out.success => {
                return Err(AccessError::Unprivileged(format!("shell runs as uid {uid}")));
            }
            _ if out.stderr.is_empty() => {
                return Err(AccessError::Unprivileged("privileged shell failed".to_owned()));
            }
            _ => return Err(AccessError::Unprivileged(out.stderr.clone())),
        }
        debug!("channel"; "privileged shell ready");

        Ok(Self {
            exec,
            config,
            last_report: Mutex::new(None),
            write_locks: DashMap::new(),
        })
    }

    pub fn executor(&self) -> &E {
        &self.exec
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Attempt log of the most recent read or write.
    pub fn last_report(&self) -> Option<AttemptReport> {
        self.last_report.lock().clone()
    }

    fn record(&self, report: AttemptReport) {
        *self.last_report.lock() = Some(report);
    }

    /// Whether `path` is an existing regular file.
    pub fn exists(&self, path: &Path) -> bool {
        self.exec.run(&[format!("test -f {}", quote_path(path))]).success
    }

    fn dir_exists(&self, dir: &Path) -> bool {
        self.exec.run(&[format!("test -d {}", quote_path(dir))]).success
    }

    // ========================================================================
    // Read
    // ========================================================================

    /// Read the whole file, trying each configured strategy in order.
    ///
    /// Empty output counts as a failed attempt.
    pub fn read(&self, path: &Path) -> Result<String, AccessError> {
        let (result, report) = self.read_chain(path);
        self.record(report);
        result
    }

    fn read_chain(&self, path: &Path) -> (Result<String, AccessError>, AttemptReport) {
        let mut report = AttemptReport::new(Operation::Read, path);
        for &strategy in &self.config.read_strategies {
            let (attempt, content) = self.try_read(strategy, path);
            debug!("read"; "{}", attempt);
            report.push(attempt);
            if let Some(content) = content {
                return (Ok(content), report);
            }
        }
        (Err(AccessError::AllStrategiesFailed(report.clone())), report)
    }

    fn try_read(&self, strategy: ReadStrategy, path: &Path) -> (Attempt, Option<String>) {
        let target = quote_path(path);
        let cat = format!("cat {target}");

        let mut note = None;
        let out = match strategy {
            ReadStrategy::Direct => self.exec.run(&[cat]),
            ReadStrategy::AsUser => self.exec.run(&[format!(
                "su {} -c {}",
                self.config.uid,
                shell_quote(&cat)
            )]),
            ReadStrategy::RelaxLabel => self.exec.run(&[
                format!("chmod 666 {target} || true"),
                format!(
                    "chcon {} {target} || true",
                    shell_quote(&self.config.security_label)
                ),
                cat,
            ]),
            ReadStrategy::LowerEnforcement => {
                let guard = EnforcementGuard::lower(&self.exec);
                if !guard.is_lowered() {
                    note = Some(match guard.previous() {
                        Some(mode) => format!("enforcement unchanged ({mode})"),
                        None => "enforcement mode unknown".to_owned(),
                    });
                }
                self.exec.run(&[cat])
            }
        };

        let mut attempt = attempt_from(strategy.name(), &out);
        if !out.success {
            attempt.note = note;
            return (attempt, None);
        }
        if out.stdout.is_empty() {
            attempt.note = Some(self::strategy::EMPTY_OUTPUT.to_owned());
            return (attempt, None);
        }
        attempt.succeeded = true;
        (attempt, Some(out.stdout))
    }

    // ========================================================================
    // Write
    // ========================================================================

    /// Replace `path` with `content` and verify by reading it back.
    ///
    /// Writes to the same path are serialized; a second writer waits until
    /// the first one's verification has finished.
    pub fn write(&self, path: &Path, content: &str) -> Result<(), ChannelError> {
        let lock = self.write_lock(path);
        let _held = lock.lock();

        let dir = path.parent().unwrap_or(Path::new("/"));
        if !self.config.create_dirs && !self.dir_exists(dir) {
            return Err(AccessError::PathNotFound(path.to_path_buf()).into());
        }

        let staged = self.stage(content)?;
        self.backup(path);

        let commands = self.write_commands(staged.path(), path, dir);
        let mut report = AttemptReport::new(Operation::Write, path);
        for &strategy in &self.config.write_strategies {
            let out = match strategy {
                WriteStrategy::StagedCopy => self.exec.run(&commands),
                WriteStrategy::StagedCopyPermissive => {
                    let _guard = EnforcementGuard::lower(&self.exec);
                    self.exec.run(&commands)
                }
            };
            let mut attempt = attempt_from(strategy.name(), &out);
            attempt.succeeded = out.success;
            debug!("write"; "{}", attempt);
            report.push(attempt);
            if out.success {
                break;
            }
        }
        drop(staged);

        if !report.succeeded() {
            self.record(report.clone());
            return Err(AccessError::AllStrategiesFailed(report).into());
        }

        let verified = self.verify(path, content, &mut report);
        self.record(report);
        verified
    }

    fn write_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        self.write_locks
            .entry(path.to_path_buf())
            .or_default()
            .clone()
    }

    /// Write `content` to a process-owned temporary file.
    fn stage(&self, content: &str) -> io::Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("dynset-").suffix(".stage");
        let mut file = match &self.config.staging_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(content.as_bytes())?;
        file.flush()?;
        Ok(file)
    }

    fn write_commands(&self, staged: &Path, path: &Path, dir: &Path) -> Vec<String> {
        let target = quote_path(path);
        let dir = quote_path(dir);

        let mut commands = Vec::with_capacity(6);
        if self.config.create_dirs {
            commands.push(format!("mkdir -p {dir}"));
        }
        commands.push(format!("cp {} {target}", quote_path(staged)));
        commands.push(format!("chmod {} {target}", self.config.file_mode));
        commands.push(format!("chown $(stat -c '%u:%g' {dir}) {target} || true"));
        if self.config.relax_label_on_write {
            commands.push(format!(
                "chcon {} {target} || true",
                shell_quote(&self.config.security_label)
            ));
        }
        commands.push("sync".to_owned());
        commands
    }

    /// Copy the current file into `backup_dir`. Never fatal.
    fn backup(&self, path: &Path) {
        let Some(dir) = &self.config.backup_dir else {
            return;
        };
        if !self.exists(path) {
            return;
        }

        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let dest = backup_path(dir, path, secs);
        let out = self.exec.run(&[
            format!("mkdir -p {}", quote_path(dir)),
            format!("cp {} {}", quote_path(path), quote_path(&dest)),
        ]);
        if out.success {
            log!("backup"; "{}", dest.display());
        } else {
            log!("backup"; "skipped, {}", out.stderr);
        }
    }

    fn verify(
        &self,
        path: &Path,
        expected: &str,
        report: &mut AttemptReport,
    ) -> Result<(), ChannelError> {
        let (result, check) = self.read_chain(path);
        report.verification = check.attempts;

        let actual = result.ok();
        if let Some(actual) = &actual
            && actual.trim_end() == expected.trim_end()
        {
            debug!("write"; "verified {} ({} bytes)", path.display(), expected.len());
            return Ok(());
        }

        Err(ChannelError::WriteVerificationFailed {
            path: path.to_path_buf(),
            expected_len: expected.len(),
            expected_fingerprint: hash::fingerprint(expected),
            actual: actual.map(|a| (a.len(), hash::fingerprint(&a))),
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn quote_path(path: &Path) -> String {
    shell_quote(&path.to_string_lossy())
}

fn attempt_from(strategy: &'static str, out: &ExecOutput) -> Attempt {
    let mut attempt = Attempt::new(strategy);
    attempt.code = out.code;
    attempt.stderr = out.stderr.trim().to_owned();
    attempt
}

/// `<dir>/<stem>_backup_<secs>.<ext>`
pub fn backup_path(dir: &Path, target: &Path, secs: u64) -> PathBuf {
    let stem = target
        .file_stem()
        .map_or_else(|| "settings".to_owned(), |s| s.to_string_lossy().into_owned());
    let name = match target.extension() {
        Some(ext) => format!("{stem}_backup_{secs}.{}", ext.to_string_lossy()),
        None => format!("{stem}_backup_{secs}"),
    };
    dir.join(name)
}
