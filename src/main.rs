//! dynset - edit app settings files through a privileged shell.

mod cli;

use std::process::ExitCode;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::common::{Context, Device, report_error};
use cli::{Cli, Commands};
use dynset::config::EngineConfig;
use dynset::logger;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = EngineConfig::load(cli.config.as_deref())?;
    logger::set_verbose(cli.verbose || config.log.verbose);
    let ctx = Context::new(config, cli.file);

    // Only `defaults` works without a privileged shell.
    let device = || Device::open(&ctx.config.channel);

    match &cli.command {
        Commands::Defaults => {
            cli::device::run_defaults(&ctx);
            Ok(())
        }
        Commands::Show {
            json,
            filter,
            fallback_default,
        } => cli::show::run_show(&device()?, &ctx, *json, filter.as_deref(), *fallback_default),
        Commands::Set { args } => cli::edit::run_set(&device()?, &ctx, args),
        Commands::Merge {
            args,
            fallback_default,
        } => cli::edit::run_merge(&device()?, &ctx, args, *fallback_default),
        Commands::Cat => cli::device::run_cat(&device()?, &ctx),
        Commands::Lang { value } => cli::device::run_lang(&device()?, &ctx, value.clone()),
        Commands::Doctor { json } => cli::device::run_doctor(&device()?, &ctx, *json),
    }
}
