//! Composition root: wires the launcher, runner and renderer for one run.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tdlrun_core::{ChannelSink, ProcessLauncher, RunOutcome};
use tdlrun_runtime::{ReplayLauncher, ReplayScript, TaskRunner, TokioProcessLauncher, locate_tdl};
use tokio::signal;
use tracing::{debug, info};

use crate::config::{build_request, runner_settings};
use crate::error::CliError;
use crate::parser::Cli;
use crate::render::{OutputMode, Renderer};

const LOGIN_HINT: &str = "tdl is not logged in. Run `tdl login` and try again.";

/// Execute one run as described by the command line.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = runner_settings(&cli)?;

    let (launcher, executable): (Arc<dyn ProcessLauncher>, PathBuf) = match &cli.replay {
        Some(path) => {
            let script = ReplayScript::from_transcript_file(path)
                .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))?;
            info!(transcript = %path.display(), "replaying transcript");
            (Arc::new(ReplayLauncher::new(script)), PathBuf::from("tdl"))
        }
        None => {
            let located = locate_tdl(settings.executable.as_deref())
                .map_err(|e| CliError::Config(e.to_string()))?;
            info!(path = %located.path.display(), source = %located.source, "using tdl");
            (Arc::new(TokioProcessLauncher::new()), located.path)
        }
    };

    let request = build_request(&cli, &executable)?;
    let runner = TaskRunner::new(launcher, settings);
    let (sink, mut events) = ChannelSink::new();
    let handle = runner.start(request, Arc::new(sink)).map_err(CliError::from)?;

    let mut renderer = Renderer::new(if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Auto
    });

    let mut ctrl_c = Box::pin(signal::ctrl_c());
    let mut cancelling = false;
    loop {
        tokio::select! {
            _ = &mut ctrl_c, if !cancelling => {
                info!("interrupt received, cancelling run");
                handle.cancel();
                cancelling = true;
            }
            event = events.recv() => {
                let Some(event) = event else { break };
                renderer.render(&event);
                if event.is_terminal() {
                    break;
                }
            }
        }
    }
    renderer.finish();

    let outcome = handle.wait().await;
    debug!(?outcome, "run finished");
    report(outcome, cli.collect && !renderer.is_machine_readable())
}

fn report(outcome: RunOutcome, print_output: bool) -> anyhow::Result<()> {
    if outcome.requires_login() {
        eprintln!("{LOGIN_HINT}");
    }
    match outcome {
        RunOutcome::Succeeded { output, .. } => {
            if let Some(output) = output.filter(|_| print_output) {
                println!("{output}");
            }
            Ok(())
        }
        RunOutcome::Failed {
            exit_code, reason, ..
        } => Err(CliError::ToolFailed {
            exit_code,
            reason: reason.to_string(),
        })
        .context("run failed"),
        RunOutcome::Cancelled => Err(CliError::Cancelled.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tdlrun_core::FailureReason;

    fn exit_code_of(result: anyhow::Result<()>) -> Option<u8> {
        result
            .err()
            .and_then(|err| err.downcast_ref::<CliError>().map(CliError::exit_code))
    }

    #[test]
    fn test_report_success() {
        let outcome = RunOutcome::Succeeded {
            exit_code: 0,
            output: None,
        };
        assert!(report(outcome, true).is_ok());
    }

    #[test]
    fn test_report_failure_keeps_tool_exit_code() {
        let outcome = RunOutcome::Failed {
            exit_code: 2,
            reason: FailureReason::NonZeroExit,
            log: "panic: invalid expression".into(),
        };
        assert_eq!(exit_code_of(report(outcome, false)), Some(2));
    }

    #[test]
    fn test_report_cancelled() {
        assert_eq!(exit_code_of(report(RunOutcome::Cancelled, false)), Some(130));
    }

    #[tokio::test]
    async fn test_replay_end_to_end() {
        use std::io::Write;
        use clap::Parser;

        let mut transcript = tempfile::NamedTempFile::new().unwrap();
        transcript
            .write_all(b"x ... 50.0% [1 MB in 1s; ETA: 1s; 1 MB/s]\rx ... done! [2 MB in 2s; 1 MB/s]\n")
            .unwrap();
        let path = transcript.path().to_string_lossy().into_owned();

        let cli = Cli::parse_from(["tdlrun", "--json", "--replay", path.as_str()]);
        assert!(run(cli).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_transcript_is_io_error() {
        use clap::Parser;

        let cli = Cli::parse_from(["tdlrun", "--replay", "/nonexistent/tdlrun/transcript.txt"]);
        assert_eq!(exit_code_of(run(cli).await), Some(74));
    }
}
