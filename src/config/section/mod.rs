//! Configuration section definitions.
//!
//! Each module corresponds to a section in `dynset.toml`:
//!
//! | Module    | TOML Section | Purpose                                  |
//! |-----------|--------------|------------------------------------------|
//! | `target`  | `[target]`   | File to edit, language file, root tag    |
//! | `channel` | `[channel]`  | Privileged shell and access strategies   |
//! | `log`     | `[log]`      | Verbosity                                |

mod channel;
mod log;
mod target;

pub use channel::ChannelConfig;
pub use log::LogConfig;
pub use target::TargetConfig;
