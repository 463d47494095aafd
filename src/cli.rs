// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `planwave`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "planwave",
    version,
    about = "Validate, analyze and run plan DAGs wave by wave.",
    long_about = None
)]
pub struct CliArgs {
    /// Plan document to run (`.json`, otherwise TOML).
    #[arg(long, value_name = "PATH")]
    pub plan: String,

    /// Engine/executor config file (TOML). Optional; defaults apply when
    /// the file does not exist.
    #[arg(long, value_name = "PATH", default_value = "Planwave.toml")]
    pub config: String,

    /// Validate and analyze the plan, print the topology, run nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Bind steps without a configured executor to the simulated executor.
    #[arg(long)]
    pub simulate: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PLANWAVE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// How events are printed on stdout.
    #[arg(long, value_enum, value_name = "FORMAT", default_value = "pretty")]
    pub events: EventFormat,

    /// JSON object used to seed the output store.
    #[arg(long, value_name = "PATH")]
    pub context: Option<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Event output format.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum EventFormat {
    /// One human-readable line per event.
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
