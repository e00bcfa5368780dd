//! dynset - edit app settings files on a rooted device.
//!
//! The engine reads a flat XML settings document through a privileged
//! shell, infers a type and a plausible range for every field, applies
//! batches of edits and writes the result back with verification.
//!
//! - [`settings`]: parsing, inference, line-exact patching, structural merge
//! - [`channel`]: privileged file access with fallback strategies
//! - [`session`]: load/edit/commit cycle on top of both
//! - [`worker`]: background thread for blocking device I/O

pub mod channel;
pub mod config;
pub mod logger;
pub mod session;
pub mod settings;
pub mod utils;
pub mod worker;
