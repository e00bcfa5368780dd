//! Command-line interface module.

mod args;
pub mod common;
pub mod device;
pub mod edit;
pub mod show;

pub use args::{Cli, Commands, EditArgs};
