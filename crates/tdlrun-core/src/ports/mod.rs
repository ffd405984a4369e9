//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the core expects from infrastructure: a way
//! to start the wrapped tool and a place to deliver events. They contain no
//! implementation details.

pub mod event_sink;
pub mod process;

use thiserror::Error;

pub use event_sink::{ChannelSink, NoopRunSink, RunEventSink};
pub use process::{ChildProcess, ProcessLauncher};

/// Errors starting a child process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The executable does not exist.
    #[error("command not found: {0}")]
    NotFound(String),

    /// The executable exists but may not be run.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The argument vector was empty.
    #[error("empty command")]
    EmptyCommand,

    /// Any other spawn failure.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors starting a run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RunnerError {
    /// Another run currently owns the runner.
    #[error("a task is already running")]
    Busy,

    /// The request cannot be executed.
    #[error("invalid run request: {0}")]
    InvalidRequest(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_error_display() {
        let err = LaunchError::NotFound("tdl".to_string());
        assert_eq!(err.to_string(), "command not found: tdl");

        let err = LaunchError::Spawn {
            program: "tdl".to_string(),
            source: std::io::Error::other("boom"),
        };
        assert!(err.to_string().contains("boom"));
    }
}
