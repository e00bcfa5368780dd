//! Scoped SELinux enforcement changes.

use super::executor::CommandExecutor;
use crate::{debug, log};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnforcementMode {
    Enforcing,
    Permissive,
    Disabled,
}

impl EnforcementMode {
    /// Parse `getenforce` output.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "Enforcing" => Some(Self::Enforcing),
            "Permissive" => Some(Self::Permissive),
            "Disabled" => Some(Self::Disabled),
            _ => None,
        }
    }

    /// Query the current mode. `None` if `getenforce` failed.
    pub fn query<E: CommandExecutor + ?Sized>(exec: &E) -> Option<Self> {
        let out = exec.run(&["getenforce".to_owned()]);
        if !out.success {
            return None;
        }
        out.first_line().and_then(Self::parse)
    }
}

impl fmt::Display for EnforcementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Enforcing => "Enforcing",
            Self::Permissive => "Permissive",
            Self::Disabled => "Disabled",
        })
    }
}

/// Holds enforcement lowered to permissive until dropped.
///
/// Restoration runs in `Drop`, so it happens on every exit path including
/// `?` returns and unwinding panics. If the mode was not `Enforcing` when the
/// guard was taken, nothing is changed and nothing is restored.
pub struct EnforcementGuard<'a, E: CommandExecutor + ?Sized> {
    exec: &'a E,
    previous: Option<EnforcementMode>,
    lowered: bool,
}

impl<'a, E: CommandExecutor + ?Sized> EnforcementGuard<'a, E> {
    pub fn lower(exec: &'a E) -> Self {
        let previous = EnforcementMode::query(exec);
        let mut lowered = false;

        if previous == Some(EnforcementMode::Enforcing) {
            let out = exec.run(&["setenforce 0".to_owned()]);
            lowered = out.success;
            if lowered {
                debug!("selinux"; "lowered to permissive");
            } else {
                debug!("selinux"; "setenforce 0 failed: {}", out.stderr);
            }
        }

        Self {
            exec,
            previous,
            lowered,
        }
    }

    /// Mode observed before lowering.
    pub fn previous(&self) -> Option<EnforcementMode> {
        self.previous
    }

    /// Whether this guard changed the mode and will restore it.
    pub fn is_lowered(&self) -> bool {
        self.lowered
    }
}

impl<E: CommandExecutor + ?Sized> Drop for EnforcementGuard<'_, E> {
    fn drop(&mut self) {
        if !self.lowered {
            return;
        }
        let out = self.exec.run(&["setenforce 1".to_owned()]);
        if out.success {
            debug!("selinux"; "restored to enforcing");
        } else {
            log!("error"; "failed to restore SELinux enforcing mode: {}", out.stderr);
        }
    }
}
