//! CLI-specific error types and exit-code mapping.

use tdlrun_core::{RunnerError, SettingsError};
use thiserror::Error;

/// Exit code used when a run was cancelled (128 + SIGINT).
const CANCELLED_EXIT_CODE: u8 = 130;

/// CLI-specific error type.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    /// Argument error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// Configuration error (bad settings, tdl not found).
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error reading an input file.
    #[error("IO error: {0}")]
    Io(String),

    /// The wrapped tool failed.
    #[error("tdl failed (exit code {exit_code}): {reason}")]
    ToolFailed { exit_code: i32, reason: String },

    /// The run was cancelled.
    #[error("cancelled")]
    Cancelled,
}

impl CliError {
    /// Map error to a process exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Reserved for specific error categories (see sysexits.h)
    /// - tool failures pass the tool's own exit code through when it fits
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Arguments(_) => 2, // EX_USAGE
            Self::Io(_) => 74,       // EX_IOERR
            Self::Config(_) => 78,   // EX_CONFIG
            Self::ToolFailed { exit_code, .. } => u8::try_from(*exit_code)
                .ok()
                .filter(|code| *code != 0)
                .unwrap_or(1),
            Self::Cancelled => CANCELLED_EXIT_CODE,
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<RunnerError> for CliError {
    fn from(err: RunnerError) -> Self {
        match err {
            RunnerError::InvalidRequest(msg) => Self::Arguments(msg),
            RunnerError::Busy => Self::Config(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Arguments("x".into()).exit_code(), 2);
        assert_eq!(CliError::Config("x".into()).exit_code(), 78);
        assert_eq!(CliError::Cancelled.exit_code(), 130);
    }

    #[test]
    fn test_tool_exit_code_passthrough() {
        let err = |exit_code| CliError::ToolFailed {
            exit_code,
            reason: String::new(),
        };
        assert_eq!(err(2).exit_code(), 2);
        assert_eq!(err(-1).exit_code(), 1);
        assert_eq!(err(300).exit_code(), 1);
    }

    #[test]
    fn test_from_runner_error() {
        let err: CliError = RunnerError::InvalidRequest("run has no tasks".into()).into();
        assert_eq!(err, CliError::Arguments("run has no tasks".into()));
    }
}
