//! Common utilities shared across CLI commands.

use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result, anyhow};

use dynset::channel::{PrivilegedChannel, SuShell};
use dynset::config::{ChannelConfig, EngineConfig, TargetConfig};
use dynset::debug;
use dynset::logger::{Activity, status_error};
use dynset::session::ReadFallback;
use dynset::worker::Worker;

/// The privileged channel plus the background thread that drives it.
///
/// Commands hand closures to [`Device::run`]; the interactive thread only
/// draws the activity line and waits.
pub struct Device {
    channel: Arc<PrivilegedChannel<SuShell>>,
    worker: Worker,
}

impl Device {
    pub fn open(config: &ChannelConfig) -> Result<Self> {
        let shell = SuShell::locate(&config.shell, config.timeout())
            .ok_or_else(|| anyhow!("privileged shell `{}` not found on PATH", config.shell))?;
        debug!("channel"; "using {}", shell.shell().display());

        let channel =
            PrivilegedChannel::open(shell, config.clone()).context("cannot open privileged channel")?;
        let worker = Worker::spawn("dynset-io").context("cannot start worker thread")?;

        Ok(Self {
            channel: Arc::new(channel),
            worker,
        })
    }

    /// Run `job` on the worker while showing `[module] subject …`.
    pub fn run<T, F>(&self, module: &str, subject: impl Display, job: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&PrivilegedChannel<SuShell>) -> T + Send + 'static,
    {
        let channel = Arc::clone(&self.channel);
        let _activity = Activity::start(module, subject);
        Ok(self.worker.run(move || job(&channel))?)
    }
}

/// Resolved settings for one invocation.
pub struct Context {
    pub config: EngineConfig,
    /// Settings file, after `--file`.
    pub path: PathBuf,
}

impl Context {
    pub fn new(config: EngineConfig, file: Option<PathBuf>) -> Self {
        let path = file.unwrap_or_else(|| config.target.path.clone());
        Self { config, path }
    }

    pub fn target(&self) -> &TargetConfig {
        &self.config.target
    }

    pub fn fallback(&self, use_default: bool) -> ReadFallback {
        if use_default {
            ReadFallback::builtin(&self.target().root_tag, self.target().root_version.as_deref())
        } else {
            ReadFallback::Fail
        }
    }
}

/// `1 field`, `2 fields`
pub fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

/// Print the error chain as a status block.
///
/// The first line is the summary; attempt reports carried by channel errors
/// follow as detail.
pub fn report_error(err: &anyhow::Error) {
    let text = format!("{err:#}");
    let (summary, detail) = text.split_once('\n').unwrap_or((&text, ""));
    status_error(summary, detail);
}
