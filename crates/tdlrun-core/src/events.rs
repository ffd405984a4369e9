//! Events delivered to run subscribers and terminal run outcomes.
//!
//! Subscribers should treat these events as the sole source of truth for
//! run progress. Events arrive strictly in the order their source lines were
//! read, and exactly one terminal event (`run_succeeded`, `run_failed` or
//! `run_cancelled`) ends every run.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Exit code reported when the tool produced no exit code of its own.
pub const NO_EXIT_CODE: i32 = -1;

/// Substring `tdl` prints when its session is missing or expired.
const UNAUTHORIZED_MARKER: &str = "not authorized";

/// Single discriminated union for everything a run reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    /// A line that matched no progress grammar.
    Log { line: String },

    /// First sighting of a file identifier in this run.
    FileStarted { id: String },

    /// Progress update for a single file.
    FileProgress {
        id: String,
        /// Percent complete as printed by the tool.
        percent: f64,
        size_info: String,
        eta: String,
        speed: String,
    },

    /// A file reported completion. Repeated completion lines repeat this event.
    FileFinished {
        id: String,
        size_info: String,
        speed: String,
    },

    /// Overall batch progress (0-100).
    AggregateProgress {
        percent: u8,
        elapsed: String,
        speed: String,
    },

    /// Resource usage reported by the tool.
    ResourceStats {
        cpu_percent: f64,
        memory: String,
        goroutines: u32,
    },

    /// Every task exited with code 0.
    RunSucceeded {
        exit_code: i32,
        /// Full cleaned output, present only when the request asked for it.
        #[serde(skip_serializing_if = "Option::is_none")]
        output: Option<String>,
    },

    /// The run failed; `log` holds every output line seen.
    RunFailed {
        exit_code: i32,
        reason: FailureReason,
        log: String,
    },

    /// The run was cancelled by the caller.
    RunCancelled,
}

impl RunEvent {
    /// Whether this event ends the run.
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::RunSucceeded { .. } | Self::RunFailed { .. } | Self::RunCancelled
        )
    }
}

/// Why a run failed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    #[error("task failed with a non-zero exit code")]
    NonZeroExit,

    #[error("command not found: {program}")]
    CommandNotFound { program: String },

    #[error("failed to start command: {message}")]
    SpawnFailed { message: String },

    #[error("command timed out after {secs} seconds; process terminated")]
    TimedOut { secs: u64 },

    #[error("error reading command output: {message}")]
    Io { message: String },
}

/// Terminal result of a run, as returned to the caller that started it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Succeeded {
        exit_code: i32,
        #[serde(skip_serializing_if = "Option::is_none")]
        output: Option<String>,
    },
    Failed {
        exit_code: i32,
        reason: FailureReason,
        log: String,
    },
    Cancelled,
}

impl RunOutcome {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Exit code of the last task, if the run got that far.
    pub const fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Succeeded { exit_code, .. } | Self::Failed { exit_code, .. } => Some(*exit_code),
            Self::Cancelled => None,
        }
    }

    /// Whether the failure log says the tool needs a fresh login.
    pub fn requires_login(&self) -> bool {
        match self {
            Self::Failed { log, .. } => looks_unauthorized(log),
            _ => false,
        }
    }
}

impl From<RunOutcome> for RunEvent {
    fn from(outcome: RunOutcome) -> Self {
        match outcome {
            RunOutcome::Succeeded { exit_code, output } => Self::RunSucceeded { exit_code, output },
            RunOutcome::Failed {
                exit_code,
                reason,
                log,
            } => Self::RunFailed {
                exit_code,
                reason,
                log,
            },
            RunOutcome::Cancelled => Self::RunCancelled,
        }
    }
}

/// Whether a failure log indicates an authentication problem.
pub fn looks_unauthorized(log: &str) -> bool {
    log.contains(UNAUTHORIZED_MARKER)
}
