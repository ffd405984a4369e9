//! Tokio-backed implementation of the process launcher port.

use std::io;
use std::process::Stdio;

use async_trait::async_trait;
use tdlrun_core::ports::{ChildProcess, LaunchError, ProcessLauncher};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::debug;

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

use super::stream::{ChunkResult, spawn_stream_reader};

/// Chunks buffered between the pipe readers and the consumer.
const CHUNK_CHANNEL_CAPACITY: usize = 64;

/// Launches real OS processes with stdout and stderr merged.
#[derive(Debug, Clone, Default)]
pub struct TokioProcessLauncher;

impl TokioProcessLauncher {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessLauncher for TokioProcessLauncher {
    async fn launch(&self, argv: &[String]) -> Result<Box<dyn ChildProcess>, LaunchError> {
        let (program, args) = argv.split_first().ok_or(LaunchError::EmptyCommand)?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| spawn_error(program, source))?;

        let (tx, rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);
        if let Some(stdout) = child.stdout.take() {
            spawn_stream_reader(stdout, "stdout", tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_stream_reader(stderr, "stderr", tx);
        }

        debug!(pid = ?child.id(), %program, "spawned child process");
        Ok(Box::new(TokioChild { child, chunks: rx }))
    }
}

fn spawn_error(program: &str, source: io::Error) -> LaunchError {
    match source.kind() {
        io::ErrorKind::NotFound => LaunchError::NotFound(program.to_string()),
        io::ErrorKind::PermissionDenied => LaunchError::PermissionDenied(program.to_string()),
        _ => LaunchError::Spawn {
            program: program.to_string(),
            source,
        },
    }
}

/// A spawned child whose output arrives through the merged chunk channel.
struct TokioChild {
    child: Child,
    chunks: mpsc::Receiver<ChunkResult>,
}

#[async_trait]
impl ChildProcess for TokioChild {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    async fn read_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
        self.chunks.recv().await.transpose()
    }

    async fn wait(&mut self) -> io::Result<Option<i32>> {
        let status = self.child.wait().await?;
        Ok(status.code())
    }

    async fn terminate(&mut self) -> io::Result<()> {
        #[cfg(unix)]
        {
            send_sigterm(&self.child)
        }

        #[cfg(not(unix))]
        {
            // No SIGTERM equivalent; terminate immediately.
            if self.child.try_wait()?.is_some() {
                return Ok(());
            }
            self.child.start_kill()
        }
    }

    async fn kill(&mut self) -> io::Result<()> {
        // Killing a reaped child is an error in tokio; treat it as done.
        if self.child.try_wait()?.is_some() {
            return Ok(());
        }
        self.child.kill().await
    }
}

#[cfg(unix)]
fn send_sigterm(child: &Child) -> io::Result<()> {
    let Some(pid) = child.id() else {
        // Already reaped
        return Ok(());
    };
    let pid = i32::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;

    match signal::kill(Pid::from_raw(pid), Signal::SIGTERM) {
        // ESRCH: the process already exited
        Ok(()) | Err(nix::errno::Errno::ESRCH) => Ok(()),
        Err(e) => Err(io::Error::other(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_argv_is_rejected() {
        let result = TokioProcessLauncher::new().launch(&[]).await;
        assert!(matches!(result, Err(LaunchError::EmptyCommand)));
    }

    #[tokio::test]
    async fn test_missing_executable_maps_to_not_found() {
        let argv = vec!["tdlrun-definitely-missing-binary".to_string()];
        let result = TokioProcessLauncher::new().launch(&argv).await;
        assert!(matches!(result, Err(LaunchError::NotFound(p)) if p == argv[0]));
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_merges_stdout_and_stderr() {
        let argv: Vec<String> = ["sh", "-c", "echo out; echo err 1>&2"]
            .into_iter()
            .map(String::from)
            .collect();
        let mut child = TokioProcessLauncher::new().launch(&argv).await.unwrap();

        let mut output = Vec::new();
        while let Some(chunk) = child.read_chunk().await.unwrap() {
            output.extend(chunk);
        }
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("out\n"));
        assert!(text.contains("err\n"));
        assert_eq!(child.wait().await.unwrap(), Some(0));
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_exit_code_reported() {
        let argv: Vec<String> = ["sh", "-c", "exit 3"].into_iter().map(String::from).collect();
        let mut child = TokioProcessLauncher::new().launch(&argv).await.unwrap();
        while child.read_chunk().await.unwrap().is_some() {}
        assert_eq!(child.wait().await.unwrap(), Some(3));
        // Killing an exited child is a no-op.
        child.kill().await.unwrap();
    }
}
