//! Graceful shutdown for child processes with terminate → kill escalation.

use std::io;
use std::time::Duration;

use tdlrun_core::ports::ChildProcess;
use tokio::time::timeout;
use tracing::debug;

/// Gracefully shut down a child, escalating to a forced kill if needed.
///
/// # Strategy
/// 1. Ask the child to exit and wait up to `grace` for it
/// 2. If still running, kill it
/// 3. Wait for reaping (required to avoid zombies)
///
/// # Returns
/// - `Ok(exit_code)` once the process has been reaped
/// - `Err` if process operations fail
pub async fn shutdown_child(
    child: &mut dyn ChildProcess,
    grace: Duration,
) -> io::Result<Option<i32>> {
    child.terminate().await?;

    if let Ok(result) = timeout(grace, child.wait()).await {
        return result;
    }

    debug!(pid = ?child.id(), grace_secs = grace.as_secs(), "child ignored terminate, killing");
    force_kill(child).await
}

/// Kill a child immediately and reap it.
pub async fn force_kill(child: &mut dyn ChildProcess) -> io::Result<Option<i32>> {
    child.kill().await?;
    child.wait().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{ReplayLauncher, ReplayScript};
    use tdlrun_core::ports::ProcessLauncher;

    fn argv() -> Vec<String> {
        vec!["tdl".to_string()]
    }

    #[tokio::test]
    async fn test_shutdown_stops_at_terminate() {
        let launcher = ReplayLauncher::new(ReplayScript::new().line("x").hang_after_output());
        let mut child = launcher.launch(&argv()).await.unwrap();

        let code = shutdown_child(child.as_mut(), Duration::from_secs(1)).await.unwrap();
        assert_eq!(code, None);
        assert_eq!(launcher.terminate_requests(), 1);
        assert_eq!(launcher.kill_requests(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_escalates_when_terminate_ignored() {
        let launcher = ReplayLauncher::new(
            ReplayScript::new()
                .hang_after_output()
                .ignore_terminate(),
        );
        let mut child = launcher.launch(&argv()).await.unwrap();

        let code = shutdown_child(child.as_mut(), Duration::from_millis(20))
            .await
            .unwrap();
        assert_eq!(code, None);
        assert_eq!(launcher.terminate_requests(), 1);
        assert_eq!(launcher.kill_requests(), 1);
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_shutdown_responds_to_sigterm() {
        use crate::process::TokioProcessLauncher;

        let argv: Vec<String> = ["sleep", "30"].into_iter().map(String::from).collect();
        let mut child = TokioProcessLauncher::new().launch(&argv).await.unwrap();

        let result = shutdown_child(child.as_mut(), Duration::from_secs(5)).await;
        assert!(result.is_ok());
    }
}
