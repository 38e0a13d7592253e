//! CLI argument definitions for the MER metadata builder.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use msp_cli::config::DEFAULT_CONFIG_FILE;

#[derive(Parser)]
#[command(
    name = "msp",
    version,
    about = "MER metadata import builder",
    long_about = "Build a terminology import list from MER guidance, DATIM exports,\n\
                  PDH derivation rules and codelist spreadsheets.\n\n\
                  Output is one JSON record per line, deduplicated and ordered\n\
                  so that repositories precede their content."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build the import list and write it as JSON lines.
    Build(BuildArgs),

    /// Build the import list and print run statistics only.
    Summary(ConfigArgs),

    /// Write the codelist display export.
    Codelists(CodelistArgs),
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Settings file; relative input paths resolve against its directory.
    #[arg(long = "config", short = 'c', value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
}

#[derive(Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output path, overriding [output].path (may contain {chunk}).
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Records per output file, overriding [output].chunk_size (0 for one file).
    #[arg(long = "chunk-size", value_name = "N")]
    pub chunk_size: Option<usize>,
}

#[derive(Args)]
pub struct CodelistArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Export path, overriding [output].codelist_json.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
