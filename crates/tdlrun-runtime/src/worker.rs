//! Run worker: drives every task of one run through the reader, classifier
//! and tracker, and decides the run's outcome.
//!
//! The worker emits everything except the terminal event; the runner emits
//! that after releasing its slot.

use std::io;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tdlrun_core::events::NO_EXIT_CODE;
use tdlrun_core::ports::{ChildProcess, LaunchError, ProcessLauncher, RunEventSink};
use tdlrun_core::{FailureReason, ProgressTracker, RunOutcome, classify_line};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::process::{force_kill, shutdown_child};
use crate::reader::LineReader;

/// Result of waiting for a child once its output has closed.
enum ExitWait {
    Exited(io::Result<Option<i32>>),
    TimedOut(Duration),
    Cancelled,
}

pub struct RunWorker {
    launcher: Arc<dyn ProcessLauncher>,
    sink: Arc<dyn RunEventSink>,
    cancel: CancellationToken,
    exit_timeout: Option<Duration>,
    grace: Duration,
    collect_output: bool,
    tracker: ProgressTracker,
    log: Vec<String>,
}

impl RunWorker {
    pub fn new(
        launcher: Arc<dyn ProcessLauncher>,
        sink: Arc<dyn RunEventSink>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            launcher,
            sink,
            cancel,
            exit_timeout: None,
            grace: Duration::from_secs(tdlrun_core::DEFAULT_TERMINATION_GRACE_SECS),
            collect_output: false,
            tracker: ProgressTracker::new(),
            log: Vec::new(),
        }
    }

    /// Bound on the wait for exit after output closes; `None` is unbounded.
    #[must_use]
    pub const fn with_exit_timeout(mut self, limit: Option<Duration>) -> Self {
        self.exit_timeout = limit;
        self
    }

    #[must_use]
    pub const fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    #[must_use]
    pub const fn with_collect_output(mut self, collect: bool) -> Self {
        self.collect_output = collect;
        self
    }

    /// Run the tasks in order, stopping at the first one that does not succeed.
    pub async fn run(mut self, tasks: &[Vec<String>]) -> RunOutcome {
        let total = tasks.len();
        for (index, argv) in tasks.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!(task = index + 1, total, "run cancelled before task start");
                return RunOutcome::Cancelled;
            }
            info!(task = index + 1, total, "running task");
            debug!(command = ?argv, "task command");

            if let ControlFlow::Break(outcome) = self.run_task(argv).await {
                return outcome;
            }
        }

        RunOutcome::Succeeded {
            exit_code: 0,
            output: self.collect_output.then(|| self.log.join("\n")),
        }
    }

    async fn run_task(&mut self, argv: &[String]) -> ControlFlow<RunOutcome> {
        let child = match self.launcher.launch(argv).await {
            Ok(child) => child,
            Err(err) => {
                warn!(error = %err, "failed to launch task");
                return ControlFlow::Break(self.launch_failed(err));
            }
        };
        let mut reader = LineReader::new(child);

        loop {
            // Cancellation wins over any line already buffered.
            let next = tokio::select! {
                biased;
                () = self.cancel.cancelled() => None,
                line = reader.next_line() => Some(line),
            };
            match next {
                None => return ControlFlow::Break(self.stop(reader.child_mut()).await),
                Some(Ok(Some(line))) => self.observe(line),
                Some(Ok(None)) => break,
                Some(Err(err)) => {
                    warn!(error = %err, "failed reading task output");
                    if let Err(kill_err) = force_kill(reader.child_mut()).await {
                        debug!(error = %kill_err, "kill after read failure failed");
                    }
                    return ControlFlow::Break(self.failed(
                        NO_EXIT_CODE,
                        FailureReason::Io {
                            message: err.to_string(),
                        },
                    ));
                }
            }
        }

        let waited = tokio::select! {
            biased;
            () = self.cancel.cancelled() => ExitWait::Cancelled,
            waited = wait_with_limit(reader.child_mut(), self.exit_timeout) => waited,
        };

        match waited {
            ExitWait::Cancelled => ControlFlow::Break(self.stop(reader.child_mut()).await),
            ExitWait::TimedOut(limit) => {
                warn!(timeout_secs = limit.as_secs(), "task did not exit in time, killing");
                if let Err(err) = force_kill(reader.child_mut()).await {
                    debug!(error = %err, "kill after timeout failed");
                }
                ControlFlow::Break(self.failed(
                    NO_EXIT_CODE,
                    FailureReason::TimedOut {
                        secs: limit.as_secs(),
                    },
                ))
            }
            ExitWait::Exited(Err(err)) => {
                warn!(error = %err, "failed waiting for task exit");
                ControlFlow::Break(self.failed(
                    NO_EXIT_CODE,
                    FailureReason::Io {
                        message: err.to_string(),
                    },
                ))
            }
            ExitWait::Exited(Ok(code)) => {
                let exit_code = code.unwrap_or(NO_EXIT_CODE);
                if exit_code == 0 {
                    debug!("task exited cleanly");
                    ControlFlow::Continue(())
                } else {
                    info!(exit_code, "task failed");
                    ControlFlow::Break(self.failed(exit_code, FailureReason::NonZeroExit))
                }
            }
        }
    }

    fn observe(&mut self, line: String) {
        for event in self.tracker.observe(classify_line(&line)) {
            self.sink.emit(event);
        }
        self.log.push(line);
    }

    async fn stop(&self, child: &mut dyn ChildProcess) -> RunOutcome {
        info!("cancelling run");
        match shutdown_child(child, self.grace).await {
            Ok(code) => debug!(exit_code = ?code, "cancelled child reaped"),
            Err(err) => warn!(error = %err, "failed to stop cancelled child"),
        }
        RunOutcome::Cancelled
    }

    fn launch_failed(&self, err: LaunchError) -> RunOutcome {
        let reason = match err {
            LaunchError::NotFound(program) => FailureReason::CommandNotFound { program },
            other => FailureReason::SpawnFailed {
                message: other.to_string(),
            },
        };
        self.failed(NO_EXIT_CODE, reason)
    }

    fn failed(&self, exit_code: i32, reason: FailureReason) -> RunOutcome {
        RunOutcome::Failed {
            exit_code,
            reason,
            log: self.log.join("\n"),
        }
    }
}

async fn wait_with_limit(child: &mut dyn ChildProcess, limit: Option<Duration>) -> ExitWait {
    match limit {
        Some(limit) => match timeout(limit, child.wait()).await {
            Ok(result) => ExitWait::Exited(result),
            Err(_) => ExitWait::TimedOut(limit),
        },
        None => ExitWait::Exited(child.wait().await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{ReplayLauncher, ReplayScript};
    use tdlrun_core::{ChannelSink, RunEvent};

    async fn run_script(launcher: ReplayLauncher, tasks: &[Vec<String>]) -> (RunOutcome, Vec<RunEvent>) {
        let (sink, mut rx) = ChannelSink::new();
        let worker = RunWorker::new(Arc::new(launcher), Arc::new(sink), CancellationToken::new());
        let outcome = worker.run(tasks).await;

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        (outcome, events)
    }

    fn task(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn test_worker_does_not_emit_terminal_event() {
        let launcher = ReplayLauncher::new(ReplayScript::new().line("hello"));
        let (outcome, events) = run_script(launcher, &[task(&["tdl"])]).await;

        assert!(outcome.is_success());
        assert_eq!(
            events,
            vec![RunEvent::Log {
                line: "hello".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_signal_exit_reports_no_exit_code() {
        let launcher = ReplayLauncher::new(ReplayScript::new().killed_by_signal());
        let (outcome, _) = run_script(launcher, &[task(&["tdl"])]).await;
        assert_eq!(outcome.exit_code(), Some(NO_EXIT_CODE));
        assert!(matches!(
            outcome,
            RunOutcome::Failed {
                reason: FailureReason::NonZeroExit,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_pre_cancelled_run_launches_nothing() {
        let launcher = Arc::new(ReplayLauncher::new(ReplayScript::new()));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let worker = RunWorker::new(launcher.clone(), Arc::new(tdlrun_core::NoopRunSink), cancel);
        assert_eq!(worker.run(&[task(&["tdl"])]).await, RunOutcome::Cancelled);
        assert!(launcher.launched().is_empty());
    }
}
