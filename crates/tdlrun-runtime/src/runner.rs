//! Single-slot task runner.
//!
//! A `TaskRunner` owns at most one active run. `tdl` keeps its session in a
//! shared local store, so a second run is rejected with
//! [`RunnerError::Busy`] instead of queued.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::FutureExt;

use tdlrun_core::events::NO_EXIT_CODE;
use tdlrun_core::ports::{ProcessLauncher, RunEventSink, RunnerError};
use tdlrun_core::{FailureReason, RunEvent, RunOutcome, RunRequest, RunnerSettings};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::worker::RunWorker;

type Slot = Arc<Mutex<Option<CancellationToken>>>;

/// Starts runs against a process launcher, one at a time.
pub struct TaskRunner {
    launcher: Arc<dyn ProcessLauncher>,
    settings: RunnerSettings,
    current: Slot,
}

impl TaskRunner {
    pub fn new(launcher: Arc<dyn ProcessLauncher>, settings: RunnerSettings) -> Self {
        Self {
            launcher,
            settings,
            current: Arc::new(Mutex::new(None)),
        }
    }

    pub const fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    /// Start a run in a background task.
    ///
    /// Every event, ending with exactly one terminal event, goes to `sink`.
    /// The returned handle resolves to the same outcome. Must be called
    /// from within a tokio runtime.
    pub fn start(
        &self,
        request: RunRequest,
        sink: Arc<dyn RunEventSink>,
    ) -> Result<RunHandle, RunnerError> {
        request.validate()?;

        let cancel = CancellationToken::new();
        {
            let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
            if current.is_some() {
                debug!("rejecting run, another run is active");
                return Err(RunnerError::Busy);
            }
            *current = Some(cancel.clone());
        }
        let guard = SlotGuard(Arc::clone(&self.current));

        let exit_timeout = match request.timeout {
            Some(Duration::ZERO) => None,
            Some(limit) => Some(limit),
            None => self.settings.command_timeout(),
        };
        let worker = RunWorker::new(Arc::clone(&self.launcher), Arc::clone(&sink), cancel.clone())
            .with_exit_timeout(exit_timeout)
            .with_grace(self.settings.termination_grace())
            .with_collect_output(request.collect_output);

        let task = tokio::spawn(async move {
            let outcome = match AssertUnwindSafe(worker.run(&request.tasks))
                .catch_unwind()
                .await
            {
                Ok(outcome) => outcome,
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    warn!(%message, "run worker panicked");
                    RunOutcome::Failed {
                        exit_code: NO_EXIT_CODE,
                        reason: FailureReason::Io { message },
                        log: String::new(),
                    }
                }
            };
            // Free the slot first so a subscriber can start the next run
            // as soon as it sees the terminal event.
            drop(guard);
            sink.emit(RunEvent::from(outcome.clone()));
            outcome
        });

        Ok(RunHandle { cancel, task })
    }

    /// Whether a run currently owns the runner.
    pub fn is_running(&self) -> bool {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Request cancellation of the active run. Returns whether one was active.
    pub fn cancel(&self) -> bool {
        let current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = current.as_ref() {
            token.cancel();
            true
        } else {
            false
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "run worker panicked".to_string())
}

/// Releases the runner slot when the run's task ends, including on panic.
struct SlotGuard(Slot);

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

/// Handle to one started run.
pub struct RunHandle {
    cancel: CancellationToken,
    task: JoinHandle<RunOutcome>,
}

impl RunHandle {
    /// Request cancellation; the outcome becomes `Cancelled`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this run, for wiring to signals.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the run to finish.
    pub async fn wait(self) -> RunOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "run task ended abnormally");
                RunOutcome::Failed {
                    exit_code: NO_EXIT_CODE,
                    reason: FailureReason::Io {
                        message: err.to_string(),
                    },
                    log: String::new(),
                }
            }
        }
    }
}
