//! Logging utilities with colored output.
//!
//! This module provides:
//! - `log!` / `debug!` macros for formatted terminal output with colored prefixes
//! - `Activity` for a transient "working on it" line during privileged calls
//! - `status_*` helpers for the final ✓ / ✗ / ⚠ outcome line
//!
//! Everything goes to stderr. Stdout is reserved for command output such as
//! `dynset cat`, so it stays pipeable.
//!
//! # Example
//!
//! ```ignore
//! log!("backup"; "{}", dest.display());
//! debug!("read"; "{}", attempt);
//!
//! let activity = Activity::start("write", path.display());
//! channel.write(path, &text)?;
//! drop(activity);
//! status_success("wrote 2 lines");
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use std::{
    fmt::Display,
    io::{IsTerminal, Write, stderr},
    sync::atomic::{AtomicBool, Ordering},
};

/// Global verbose flag (set by --verbose or `[log] verbose`)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Whether an `Activity` line is currently on screen.
static ACTIVITY: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module);
    let mut err = stderr().lock();
    clear_activity(&mut err);
    writeln!(err, "{prefix} {message}").ok();
    err.flush().ok();
}

/// Apply color to a module prefix based on module type
fn colorize_prefix(module: &str) -> String {
    let prefix = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "error" => prefix.bright_red().bold().to_string(),
        "warning" => prefix.yellow().bold().to_string(),
        "read" | "write" | "shell" | "selinux" | "channel" => {
            prefix.bright_blue().bold().to_string()
        }
        "backup" | "session" => prefix.bright_green().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

fn clear_activity(out: &mut impl Write) {
    if ACTIVITY.load(Ordering::SeqCst) {
        execute!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
    }
}

// ============================================================================
// Activity (transient single line)
// ============================================================================

/// Transient `[module] subject …` line shown while a slow call runs.
///
/// Only drawn on a terminal. Log lines printed meanwhile clear it first;
/// dropping the value erases it.
pub struct Activity {
    drawn: bool,
}

impl Activity {
    pub fn start(module: &str, subject: impl Display) -> Self {
        let err = stderr();
        if !err.is_terminal() || is_verbose() {
            return Self { drawn: false };
        }

        let line = format!("{} {subject} {}", colorize_prefix(module), "…".dimmed());
        let mut err = err.lock();
        execute!(err, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        write!(err, "{line}").ok();
        err.flush().ok();
        ACTIVITY.store(true, Ordering::SeqCst);
        Self { drawn: true }
    }
}

impl Drop for Activity {
    fn drop(&mut self) {
        if self.drawn {
            let mut err = stderr().lock();
            clear_activity(&mut err);
            err.flush().ok();
            ACTIVITY.store(false, Ordering::SeqCst);
        }
    }
}

// ============================================================================
// Outcome status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Success,
    Error,
    Warning,
}

fn status_line(status: Status, summary: &str, detail: &str) -> String {
    let symbol = match status {
        Status::Success => "✓".green().to_string(),
        Status::Error => "✗".red().to_string(),
        Status::Warning => "⚠".yellow().to_string(),
    };
    if detail.is_empty() {
        format!("{symbol} {summary}")
    } else {
        format!("{symbol} {summary}\n{detail}")
    }
}

fn print_status(status: Status, summary: &str, detail: &str) {
    let mut err = stderr().lock();
    clear_activity(&mut err);
    writeln!(err, "{}", status_line(status, summary, detail)).ok();
    err.flush().ok();
}

pub fn status_success(message: &str) {
    print_status(Status::Success, message, "");
}

/// Error summary with optional multi-line detail (e.g. an attempt report).
pub fn status_error(summary: &str, detail: &str) {
    print_status(Status::Error, summary, detail);
}

pub fn status_warning(message: &str) {
    print_status(Status::Warning, message, "");
}

// ============================================================================
// Tests
// ============================================================================
