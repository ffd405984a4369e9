//! Runner settings and validation.
//!
//! Pure domain types with no infrastructure dependencies. Adapters decide
//! where the values come from (environment, flags, a settings file).

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default bound on waiting for `tdl` to exit once its output closes.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 300;

/// Default time a cancelled child gets to exit before it is killed.
pub const DEFAULT_TERMINATION_GRACE_SECS: u64 = 5;

const MAX_COMMAND_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// Settings shared by every run started from one runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSettings {
    /// Explicit path to the `tdl` executable; discovered when `None`.
    pub executable: Option<PathBuf>,

    /// Exit timeout in seconds; 0 disables it.
    pub command_timeout_secs: u64,

    /// Grace period between terminate and kill on cancellation.
    pub termination_grace_secs: u64,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            executable: None,
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            termination_grace_secs: DEFAULT_TERMINATION_GRACE_SECS,
        }
    }
}

impl RunnerSettings {
    /// Effective exit timeout, `None` when unbounded.
    pub const fn command_timeout(&self) -> Option<Duration> {
        if self.command_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.command_timeout_secs))
        }
    }

    pub const fn termination_grace(&self) -> Duration {
        Duration::from_secs(self.termination_grace_secs)
    }

    #[must_use]
    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    #[must_use]
    pub const fn with_command_timeout_secs(mut self, secs: u64) -> Self {
        self.command_timeout_secs = secs;
        self
    }

    #[must_use]
    pub const fn with_termination_grace_secs(mut self, secs: u64) -> Self {
        self.termination_grace_secs = secs;
        self
    }
}

/// Settings validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("command timeout must be at most {max} seconds, got {got}")]
    TimeoutTooLarge { max: u64, got: u64 },

    #[error("termination grace period must be at least one second")]
    ZeroGracePeriod,

    #[error("executable path is empty")]
    EmptyExecutable,
}

/// Validate runner settings.
pub fn validate_settings(settings: &RunnerSettings) -> Result<(), SettingsError> {
    if settings.command_timeout_secs > MAX_COMMAND_TIMEOUT_SECS {
        return Err(SettingsError::TimeoutTooLarge {
            max: MAX_COMMAND_TIMEOUT_SECS,
            got: settings.command_timeout_secs,
        });
    }
    if settings.termination_grace_secs == 0 {
        return Err(SettingsError::ZeroGracePeriod);
    }
    if settings
        .executable
        .as_ref()
        .is_some_and(|p| p.as_os_str().is_empty())
    {
        return Err(SettingsError::EmptyExecutable);
    }
    Ok(())
}
