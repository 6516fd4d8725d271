//! Command-line entry point shared by the plugin binaries.

use crate::dispatch::Dispatcher;
use crate::exit_codes::ExitCode;
use crate::logging::{init_logging, LogFormat};
use crate::runtime::{PluginHandle, PluginRuntime};
use ap_config::SourceMode;
use clap::builder::BoolishValueParser;
use clap::{ArgAction, CommandFactory, FromArgMatches, Parser};
use std::io::{self, BufRead, Write};
use tracing::{error, info};

/// Process-level settings. Plugin options arrive later through `initialize`.
#[derive(Debug, Clone, Parser)]
#[command(version, about = "Agent plugin speaking line-delimited JSON on stdin/stdout")]
pub struct PluginArgs {
    /// Use deterministic simulated sources instead of the real system
    #[arg(
        long,
        env = "STAVILY_DEMO_MODE",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        default_value_t = true
    )]
    pub demo_mode: bool,

    /// Log level or filter directive; RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log record format on stderr
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl PluginArgs {
    /// Parse the process arguments, naming the command after the binary.
    pub fn parse_for(name: &'static str) -> Self {
        let matches = Self::command().name(name).bin_name(name).get_matches();
        Self::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
    }

    pub fn source_mode(&self) -> SourceMode {
        SourceMode::from_demo_flag(self.demo_mode)
    }
}

/// Run a plugin binary on stdin/stdout.
pub fn run(name: &'static str, build: fn(SourceMode) -> PluginHandle) -> ExitCode {
    let args = PluginArgs::parse_for(name);
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_with(&args, build, stdin.lock(), stdout.lock())
}

/// Run a plugin over arbitrary streams.
pub fn run_with<R: BufRead, W: Write>(
    args: &PluginArgs,
    build: fn(SourceMode) -> PluginHandle,
    input: R,
    output: W,
) -> ExitCode {
    if let Err(err) = init_logging(&args.log_level, args.log_format) {
        eprintln!("error: {err}");
        return ExitCode::ConfigError;
    }

    let mode = args.source_mode();
    let handle = build(mode);
    info!(plugin = handle.descriptor().id, %mode, "starting plugin");

    let mut dispatcher = Dispatcher::new(PluginRuntime::new(handle));
    match dispatcher.serve(input, output) {
        Ok(_) => ExitCode::Clean,
        Err(err @ ap_common::Error::Io(_)) => {
            error!(code = err.code(), error = %err, "protocol stream failed");
            ExitCode::IoError
        }
        Err(err) => {
            error!(code = err.code(), error = %err, "plugin loop aborted");
            ExitCode::InternalError
        }
    }
}
