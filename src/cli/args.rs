//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Edit app settings files through a privileged shell
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: search upward for dynset.toml)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Enable verbose output: strategy attempts, shell commands, parser notes
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file on the device (overrides `target.path`)
    #[arg(short, long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub file: Option<PathBuf>,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List every field with its kind, value and inferred range
    #[command(visible_alias = "ls")]
    Show {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Only fields whose name contains this text (case-insensitive)
        #[arg(value_name = "FILTER")]
        filter: Option<String>,

        /// Show the built-in default document if the file cannot be read
        #[arg(long)]
        fallback_default: bool,
    },

    /// Change fields, rewriting only their lines, then verify
    Set {
        #[command(flatten)]
        args: EditArgs,
    },

    /// Merge values into the current file structurally, then verify
    Merge {
        #[command(flatten)]
        args: EditArgs,

        /// Merge onto the built-in default document if the file cannot be read
        #[arg(long)]
        fallback_default: bool,
    },

    /// Print the raw file
    Cat,

    /// Print the built-in default document
    Defaults,

    /// Show or change the language key
    Lang {
        /// New value. Omit to print the current one.
        value: Option<String>,
    },

    /// Report privilege, SELinux mode, file presence and labels
    Doctor {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

/// Shared arguments for `set` and `merge`.
#[derive(clap::Args, Debug, Clone)]
pub struct EditArgs {
    /// Assignments such as `ResolutionX=1920`
    #[arg(value_name = "NAME=VALUE", required = true)]
    pub assignments: Vec<String>,

    /// Show what would change without writing
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_set() {
        let cli = Cli::parse_from(["dynset", "-v", "set", "ResolutionX=1920", "HDR=true", "-n"]);
        assert!(cli.verbose);
        let Commands::Set { args } = cli.command else {
            panic!("expected set");
        };
        assert_eq!(args.assignments, ["ResolutionX=1920", "HDR=true"]);
        assert!(args.dry_run);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["dynset", "show", "--json", "-f", "/data/x.xml", "-C", "a.toml"]);
        assert_eq!(cli.file, Some(PathBuf::from("/data/x.xml")));
        assert_eq!(cli.config, Some(PathBuf::from("a.toml")));
        assert!(matches!(cli.command, Commands::Show { json: true, .. }));
    }

    #[test]
    fn test_set_requires_assignment() {
        assert!(Cli::try_parse_from(["dynset", "set"]).is_err());
    }

    #[test]
    fn test_defaults_takes_no_device_flags() {
        let cli = Cli::parse_from(["dynset", "defaults", "-C", "a.toml"]);
        assert!(matches!(cli.command, Commands::Defaults));
        assert!(Cli::try_parse_from(["dynset", "defaults", "-n"]).is_err());
    }
}
