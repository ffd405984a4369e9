//! Command-line argument definition.

use std::path::PathBuf;

use clap::Parser;
use tdlrun_core::{DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_TERMINATION_GRACE_SECS};

/// Run `tdl` and report its downloads as structured progress.
///
/// Everything after the options is passed to `tdl` unchanged.
#[derive(Debug, Parser)]
#[command(name = "tdlrun")]
#[command(version, about = "Run tdl and report its progress")]
pub struct Cli {
    /// Path to the tdl executable (default: bundled bin/ directory, then PATH)
    #[arg(long = "tdl", env = "TDL_PATH", value_name = "PATH")]
    pub tdl: Option<PathBuf>,

    /// Seconds to wait for tdl to exit once its output closes (0 = no limit)
    #[arg(
        long,
        env = "TDLRUN_TIMEOUT",
        value_name = "SECS",
        default_value_t = DEFAULT_COMMAND_TIMEOUT_SECS
    )]
    pub timeout: u64,

    /// Seconds a cancelled tdl gets to exit before it is killed
    #[arg(
        long,
        env = "TDLRUN_GRACE",
        value_name = "SECS",
        default_value_t = DEFAULT_TERMINATION_GRACE_SECS
    )]
    pub grace: u64,

    /// Print tdl's full output after a successful run
    #[arg(long)]
    pub collect: bool,

    /// Run one tdl argument list per line of FILE, stopping at the first failure
    #[arg(long, value_name = "FILE", conflicts_with = "args")]
    pub batch: Option<PathBuf>,

    /// Replay a captured tdl transcript instead of running tdl
    #[arg(long, value_name = "FILE")]
    pub replay: Option<PathBuf>,

    /// Print one JSON event per line instead of progress bars
    #[arg(long)]
    pub json: bool,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Arguments passed to tdl
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "TDL_ARGS")]
    pub args: Vec<String>,
}
