//! Channel error types.

use super::strategy::AttemptReport;
use std::path::PathBuf;
use thiserror::Error;

/// The file could not be reached at all.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("no privileged access: {0}")]
    Unprivileged(String),

    #[error("parent directory of `{}` does not exist", .0.display())]
    PathNotFound(PathBuf),

    #[error("every strategy failed\n{0}")]
    AllStrategiesFailed(AttemptReport),
}

/// Outcome of a channel operation other than success.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error(transparent)]
    Access(#[from] AccessError),

    /// The write went through but reading back did not return the content.
    #[error(
        "write to `{}` did not verify: expected {expected_len} bytes [{expected_fingerprint}], {}",
        .path.display(),
        describe_actual(.actual)
    )]
    WriteVerificationFailed {
        path: PathBuf,
        expected_len: usize,
        expected_fingerprint: String,
        /// Length and fingerprint of what was read back, `None` if unreadable.
        actual: Option<(usize, String)>,
    },

    #[error("failed to stage content: {0}")]
    Stage(#[from] std::io::Error),
}

fn describe_actual(actual: &Option<(usize, String)>) -> String {
    match actual {
        Some((len, fingerprint)) => format!("found {len} bytes [{fingerprint}]"),
        None => "file unreadable after write".to_owned(),
    }
}

impl ChannelError {
    /// Attempt log attached to the error, if any.
    pub fn report(&self) -> Option<&AttemptReport> {
        match self {
            Self::Access(AccessError::AllStrategiesFailed(report)) => Some(report),
            _ => None,
        }
    }
}
