//! One edit/commit cycle over a settings file.
//!
//! ```text
//! load ──▶ PrivilegedChannel::read ──▶ settings::parse ──▶ EditSession
//!            │ failed + UseDefault                         │ apply(EditSet)
//!            └──▶ default_document ──▶ parse ──────────────┤ preview()
//!                                                          ▼
//!                        commit_exact (line patch) / commit_merge (structural)
//!                                                          │
//!                                   PrivilegedChannel::write + verify
//! ```
//!
//! A session owns its [`ParsedDocument`] and is consumed by either commit, so
//! a document is never written twice or reused after the file changed.

use crate::channel::{AccessError, ChannelError, CommandExecutor, PrivilegedChannel};
use crate::settings::{
    self, EditReport, EditSet, LineChange, MergeError, MergeOutcome, ParseError, ParsedDocument,
};
use crate::{debug, log};
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error("cannot parse `{}`", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("cannot merge into `{}`", .path.display())]
    Merge {
        path: PathBuf,
        #[source]
        source: MergeError,
    },
}

/// What to do when the file cannot be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadFallback {
    /// Surface the read error.
    Fail,
    /// Start from this document text instead.
    UseDefault(String),
}

impl ReadFallback {
    /// Fall back to the built-in stock document.
    pub fn builtin(root_tag: &str, version: Option<&str>) -> Self {
        Self::UseDefault(settings::default_document(root_tag, version))
    }
}

/// Where the session's document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Device,
    BuiltinDefault,
}

/// Result of a line-exact commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// Lines rewritten, in file order.
    pub changes: Vec<LineChange>,
    /// `false` when nothing differed and no write was issued.
    pub written: bool,
}

pub struct EditSession<'c, E: CommandExecutor> {
    channel: &'c PrivilegedChannel<E>,
    path: PathBuf,
    source: String,
    document: ParsedDocument,
    origin: Origin,
}

impl<'c, E: CommandExecutor> EditSession<'c, E> {
    /// Read and parse `path`.
    pub fn load(
        channel: &'c PrivilegedChannel<E>,
        path: &Path,
        fallback: ReadFallback,
    ) -> Result<Self, SessionError> {
        let (source, origin) = match (channel.read(path), fallback) {
            (Ok(text), _) => (text, Origin::Device),
            (Err(e), ReadFallback::Fail) => return Err(e.into()),
            (Err(e), ReadFallback::UseDefault(text)) => {
                log!("session"; "read failed, using built-in defaults");
                debug!("session"; "{e}");
                (text, Origin::BuiltinDefault)
            }
        };

        let document = settings::parse(&source).map_err(|source| SessionError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if !document.unparsed_lines().is_empty() {
            debug!(
                "parse";
                "{} unrecognized line(s): {:?}",
                document.unparsed_lines().len(),
                document.unparsed_lines()
            );
        }
        debug!("parse"; "{} fields from {}", document.fields().len(), path.display());

        Ok(Self {
            channel,
            path: path.to_path_buf(),
            source,
            document,
            origin,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn document(&self) -> &ParsedDocument {
        &self.document
    }

    /// Text the document was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Apply a batch of edits to the in-memory document.
    pub fn apply(&mut self, edits: &EditSet) -> EditReport {
        self.document.apply_edits(edits)
    }

    /// Lines a commit would rewrite.
    pub fn preview(&self) -> Vec<LineChange> {
        settings::changed_lines(&self.document)
    }

    /// Full text a line-exact commit would write.
    pub fn render(&self) -> String {
        settings::patch::apply(&self.document)
    }

    /// Merge `updates` onto the loaded text without writing.
    pub fn preview_merge(
        &self,
        updates: &FxHashMap<String, String>,
    ) -> Result<MergeOutcome, SessionError> {
        settings::reconcile(&self.source, updates).map_err(|source| SessionError::Merge {
            path: self.path.clone(),
            source,
        })
    }

    /// Write the line-exact patch and verify it.
    ///
    /// A device document without modifications is not written. A document
    /// that came from the built-in defaults is always written.
    pub fn commit_exact(self) -> Result<Commit, SessionError> {
        let changes = self.preview();
        if changes.is_empty() && self.origin == Origin::Device {
            debug!("session"; "no changes, skipping write");
            return Ok(Commit {
                changes,
                written: false,
            });
        }

        let text = self.render();
        self.channel.write(&self.path, &text)?;
        Ok(Commit {
            changes,
            written: true,
        })
    }

    /// Merge `updates` onto the current file content and write the result.
    ///
    /// The file is re-read first so changes made by the owning app since
    /// `load` survive. If it is unreadable and the session started from
    /// defaults, the default text is used as the base.
    pub fn commit_merge(
        self,
        updates: &FxHashMap<String, String>,
    ) -> Result<MergeOutcome, SessionError> {
        let base = match self.channel.read(&self.path) {
            Ok(text) => text,
            Err(_) if self.origin == Origin::BuiltinDefault => self.source,
            Err(e) => return Err(e.into()),
        };

        let outcome = settings::reconcile(&base, updates).map_err(|source| SessionError::Merge {
            path: self.path.clone(),
            source,
        })?;
        for name in &outcome.unknown {
            log!("merge"; "no field named `{name}`, skipped");
        }

        self.channel.write(&self.path, &outcome.text)?;
        Ok(outcome)
    }
}

// ============================================================================
// KEY=VALUE files
// ============================================================================

/// Read `key` from a `KEY=VALUE` file. `None` if the key is absent.
pub fn read_key<E: CommandExecutor>(
    channel: &PrivilegedChannel<E>,
    path: &Path,
    key: &str,
) -> Result<Option<String>, SessionError> {
    let text = channel.read(path)?;
    Ok(settings::get_key(&text, key).map(str::to_owned))
}

/// Set `key` in a `KEY=VALUE` file, creating the file if it does not exist.
///
/// An existing file that every strategy reads as empty is treated as empty text.
///
/// Returns `false` when the key already had this value and nothing was written.
pub fn write_key<E: CommandExecutor>(
    channel: &PrivilegedChannel<E>,
    path: &Path,
    key: &str,
    value: &str,
) -> Result<bool, SessionError> {
    let text = match channel.read(path) {
        Ok(text) => text,
        Err(AccessError::AllStrategiesFailed(report))
            if report.saw_empty_output() && channel.exists(path) =>
        {
            debug!("session"; "{} is empty", path.display());
            String::new()
        }
        Err(_) if !channel.exists(path) => String::new(),
        Err(e) => return Err(e.into()),
    };

    if settings::get_key(&text, key) == Some(value) {
        return Ok(false);
    }
    let updated = settings::set_key(&text, key, value);
    channel.write(path, &updated)?;
    Ok(true)
}
