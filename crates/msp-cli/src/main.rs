//! MER metadata import builder CLI.

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{ColorChoice, Parser};
use tracing::level_filters::LevelFilter;

use msp_cli::commands::{OutputOverrides, run_build, run_codelists, run_summary};
use msp_cli::config::{Settings, settings_base_dir};
use msp_cli::logging::{LogConfig, LogFormat, init_logging};
use msp_cli::summary::print_summary;

mod cli;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run(cli.command) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn load_settings(path: &Path) -> Result<(Settings, PathBuf)> {
    Ok((Settings::load_or_default(path)?, settings_base_dir(path)))
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Build(args) => {
            let (settings, base_dir) = load_settings(&args.config.config)?;
            let overrides = OutputOverrides {
                path: args.output,
                chunk_size: args.chunk_size,
            };
            let report = run_build(&settings, &base_dir, &overrides)?;
            print_summary(&report.stats, &report.files);
            if let Some(path) = &report.codelist_export {
                println!("Codelists: {}", path.display());
            }
        }
        Command::Summary(args) => {
            let (settings, base_dir) = load_settings(&args.config)?;
            let stats = run_summary(&settings, &base_dir)?;
            print_summary(&stats, &[]);
        }
        Command::Codelists(args) => {
            let (settings, base_dir) = load_settings(&args.config.config)?;
            let path = run_codelists(&settings, &base_dir, args.output)?;
            println!("Codelists: {}", path.display());
        }
    }
    Ok(())
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
