//! tdlrun command-line front end.
//!
//! Runs `tdl`, renders its progress on the terminal (or as JSON lines) and
//! maps the run's outcome to an exit code.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Used by main.rs only
use dotenvy as _;

pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod parser;
pub mod render;

pub use app::run;
pub use error::CliError;
pub use logging::init_tracing;
pub use parser::Cli;
