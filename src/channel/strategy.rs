//! Access strategies and the per-operation attempt log.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Ways of reading a file the process does not own, cheapest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadStrategy {
    /// Privileged `cat`.
    Direct,
    /// `cat` through `su <uid> -c`.
    AsUser,
    /// Best-effort `chmod 666` and `chcon` on the file, then `cat`.
    RelaxLabel,
    /// `cat` while SELinux is temporarily permissive.
    LowerEnforcement,
}

impl ReadStrategy {
    pub const ALL: [Self; 4] = [
        Self::Direct,
        Self::AsUser,
        Self::RelaxLabel,
        Self::LowerEnforcement,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::AsUser => "as-user",
            Self::RelaxLabel => "relax-label",
            Self::LowerEnforcement => "lower-enforcement",
        }
    }
}

/// Ways of replacing a file the process does not own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteStrategy {
    /// Copy a staged file over the target, then fix mode and owner.
    StagedCopy,
    /// `StagedCopy` while SELinux is temporarily permissive.
    StagedCopyPermissive,
}

impl WriteStrategy {
    pub const ALL: [Self; 2] = [Self::StagedCopy, Self::StagedCopyPermissive];

    pub const fn name(self) -> &'static str {
        match self {
            Self::StagedCopy => "staged-copy",
            Self::StagedCopyPermissive => "staged-copy-permissive",
        }
    }
}

impl fmt::Display for ReadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for WriteStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Attempt log
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Read,
    Write,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::Write => "write",
        })
    }
}

/// Note on a read attempt that exited zero but printed nothing.
pub const EMPTY_OUTPUT: &str = "empty output";

/// One strategy tried once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attempt {
    pub strategy: &'static str,
    pub succeeded: bool,
    /// Exit code of the privileged script, when it ran to completion.
    pub code: Option<i32>,
    /// Captured stderr, trimmed.
    pub stderr: String,
    /// Why the attempt counts as failed despite a zero exit code.
    pub note: Option<String>,
}

impl Attempt {
    pub fn new(strategy: &'static str) -> Self {
        Self {
            strategy,
            succeeded: false,
            code: None,
            stderr: String::new(),
            note: None,
        }
    }
}

/// Every attempt made for one read or write, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptReport {
    pub operation: Operation,
    pub path: PathBuf,
    pub attempts: Vec<Attempt>,
    /// Read attempts made to verify a write.
    pub verification: Vec<Attempt>,
}

impl AttemptReport {
    pub fn new(operation: Operation, path: &Path) -> Self {
        Self {
            operation,
            path: path.to_path_buf(),
            attempts: Vec::new(),
            verification: Vec::new(),
        }
    }

    pub fn push(&mut self, attempt: Attempt) {
        self.attempts.push(attempt);
    }

    /// Strategy that succeeded, if any.
    pub fn winner(&self) -> Option<&'static str> {
        self.attempts
            .iter()
            .find(|a| a.succeeded)
            .map(|a| a.strategy)
    }

    pub fn succeeded(&self) -> bool {
        self.winner().is_some()
    }

    /// Some strategy could read the file and found it empty.
    pub fn saw_empty_output(&self) -> bool {
        self.attempts
            .iter()
            .any(|a| a.code == Some(0) && a.note.as_deref() == Some(EMPTY_OUTPUT))
    }
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.succeeded { "ok" } else { "failed" };
        write!(f, "{}: {status}", self.strategy)?;
        if let Some(code) = self.code
            && code != 0
        {
            write!(f, " (exit {code})")?;
        }
        if let Some(note) = &self.note {
            write!(f, ", {note}")?;
        }
        if !self.stderr.is_empty() {
            write!(f, "\n    {}", self.stderr.replace('\n', "\n    "))?;
        }
        Ok(())
    }
}

impl fmt::Display for AttemptReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.operation, self.path.display())?;
        for attempt in &self.attempts {
            write!(f, "\n  {attempt}")?;
        }
        if !self.verification.is_empty() {
            write!(f, "\n  verification:")?;
            for attempt in &self.verification {
                write!(f, "\n  {attempt}")?;
            }
        }
        Ok(())
    }
}
