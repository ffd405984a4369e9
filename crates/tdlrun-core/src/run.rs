//! Run requests and per-file transfer state.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ports::RunnerError;

/// Request to execute one or more `tdl` invocations as a single run.
///
/// Tasks run sequentially and share progress state; the first failing task
/// ends the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    /// Argument vectors; element 0 of each is the executable.
    pub tasks: Vec<Vec<String>>,
    /// Bound on waiting for each task to exit after its output closes.
    /// `None` defers to the runner's settings.
    pub timeout: Option<Duration>,
    /// Attach the full cleaned output to the success event.
    pub collect_output: bool,
}

impl RunRequest {
    /// Create a request for a single invocation.
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::batch(vec![argv.into_iter().map(Into::into).collect()])
    }

    /// Create a request for several invocations run back to back.
    pub const fn batch(tasks: Vec<Vec<String>>) -> Self {
        Self {
            tasks,
            timeout: None,
            collect_output: false,
        }
    }

    /// Override the exit timeout. `Duration::ZERO` means unbounded.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Collect the full output for the success event.
    #[must_use]
    pub const fn collecting_output(mut self) -> Self {
        self.collect_output = true;
        self
    }

    /// Reject requests with no tasks or an empty argument vector.
    pub fn validate(&self) -> Result<(), RunnerError> {
        if self.tasks.is_empty() {
            return Err(RunnerError::InvalidRequest(
                "run has no tasks".to_string(),
            ));
        }
        if let Some(index) = self
            .tasks
            .iter()
            .position(|argv| argv.first().is_none_or(|program| program.is_empty()))
        {
            return Err(RunnerError::InvalidRequest(format!(
                "task {} has no executable",
                index + 1
            )));
        }
        Ok(())
    }
}

/// Last known state of one file transfer within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileTransferState {
    /// Identifier exactly as printed by the tool.
    pub id: String,
    /// Percent complete (0-100).
    pub percent: f64,
    pub size_info: String,
    pub eta: String,
    pub speed: String,
    pub done: bool,
}

impl FileTransferState {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            percent: 0.0,
            size_info: String::new(),
            eta: String::new(),
            speed: String::new(),
            done: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_task_request() {
        let request = RunRequest::new(["tdl", "chat", "ls"]);
        assert_eq!(request.tasks.len(), 1);
        assert_eq!(request.tasks[0], vec!["tdl", "chat", "ls"]);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_builder_options() {
        let request = RunRequest::new(["tdl"])
            .with_timeout(Duration::from_secs(10))
            .collecting_output();
        assert_eq!(request.timeout, Some(Duration::from_secs(10)));
        assert!(request.collect_output);
    }

    #[test]
    fn test_validate_rejects_empty_requests() {
        assert!(RunRequest::batch(Vec::new()).validate().is_err());

        let err = RunRequest::batch(vec![vec!["tdl".to_string()], Vec::new()])
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("task 2"));

        assert!(RunRequest::new([""]).validate().is_err());
    }
}
