//! Core of tdlrun: turns the output stream of the `tdl` command-line tool
//! into structured progress events.
//!
//! - `text` - byte-to-line assembly and line cleaning
//! - `classify` - the line grammars (completion, progress, aggregate, stats)
//! - `tracker` - per-run file state machine producing [`RunEvent`]s
//! - `events` - event and outcome types delivered to subscribers
//! - `run` - run requests and per-file transfer state
//! - `settings` - runner settings and validation
//! - `ports` - traits for launching processes and receiving events

#![deny(unused_crate_dependencies)]

pub mod classify;
pub mod events;
pub mod ports;
pub mod run;
pub mod settings;
pub mod text;
pub mod tracker;

pub use classify::{ClassifiedLine, classify_line};
pub use events::{FailureReason, RunEvent, RunOutcome, looks_unauthorized};
pub use ports::{
    ChannelSink, ChildProcess, LaunchError, NoopRunSink, ProcessLauncher, RunEventSink,
    RunnerError,
};
pub use run::{FileTransferState, RunRequest};
pub use settings::{
    DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_TERMINATION_GRACE_SECS, RunnerSettings, SettingsError,
    validate_settings,
};
pub use text::{LineAssembler, clean_line};
pub use tracker::ProgressTracker;

#[cfg(test)]
use serde_json as _;
