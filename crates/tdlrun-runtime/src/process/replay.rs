//! Scripted process launcher.
//!
//! Replays recorded or hand-written `tdl` output through the full
//! reader/classifier/tracker pipeline without spawning anything. Used by
//! the test suite and by `tdlrun --replay`.

use std::collections::VecDeque;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tdlrun_core::ports::{ChildProcess, LaunchError, ProcessLauncher};

/// Output and exit behaviour of one replayed process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayScript {
    chunks: Vec<Vec<u8>>,
    exit_code: Option<i32>,
    hang_after_output: bool,
    hang_on_exit: bool,
    ignore_terminate: bool,
}

impl Default for ReplayScript {
    fn default() -> Self {
        Self {
            chunks: Vec::new(),
            exit_code: Some(0),
            hang_after_output: false,
            hang_on_exit: false,
            ignore_terminate: false,
        }
    }
}

impl ReplayScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a script that emits `transcript` verbatim in one chunk and exits 0.
    pub fn from_transcript(transcript: impl Into<Vec<u8>>) -> Self {
        Self::new().raw(transcript)
    }

    /// Read a captured transcript from disk.
    pub fn from_transcript_file(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::from_transcript(std::fs::read(path)?))
    }

    /// Emit one line followed by `\n`.
    #[must_use]
    pub fn line(mut self, line: &str) -> Self {
        let mut chunk = line.as_bytes().to_vec();
        chunk.push(b'\n');
        self.chunks.push(chunk);
        self
    }

    /// Emit raw bytes as a single chunk.
    #[must_use]
    pub fn raw(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.chunks.push(bytes.into());
        self
    }

    #[must_use]
    pub const fn exit_code(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    /// Exit without a code, as if killed by a signal.
    #[must_use]
    pub const fn killed_by_signal(mut self) -> Self {
        self.exit_code = None;
        self
    }

    /// Keep the output stream open after the scripted chunks until stopped.
    #[must_use]
    pub const fn hang_after_output(mut self) -> Self {
        self.hang_after_output = true;
        self
    }

    /// Close the output stream but never exit until stopped.
    #[must_use]
    pub const fn hang_on_exit(mut self) -> Self {
        self.hang_on_exit = true;
        self
    }

    /// Only a forced kill stops the process.
    #[must_use]
    pub const fn ignore_terminate(mut self) -> Self {
        self.ignore_terminate = true;
        self
    }
}

#[derive(Debug, Default)]
struct Counters {
    terminate: AtomicUsize,
    kill: AtomicUsize,
}

/// Launcher that plays back [`ReplayScript`]s.
///
/// Each launch consumes the next queued script; the last one repeats once
/// the queue runs dry.
#[derive(Debug)]
pub struct ReplayLauncher {
    scripts: Mutex<VecDeque<ReplayScript>>,
    last: Mutex<Option<ReplayScript>>,
    missing: bool,
    launched: Mutex<Vec<Vec<String>>>,
    counters: Arc<Counters>,
}

impl ReplayLauncher {
    /// Replay `script` for every launch.
    pub fn new(script: ReplayScript) -> Self {
        Self::sequence(vec![script])
    }

    /// Replay `scripts` in launch order.
    pub fn sequence(scripts: Vec<ReplayScript>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            last: Mutex::new(None),
            missing: false,
            launched: Mutex::new(Vec::new()),
            counters: Arc::default(),
        }
    }

    /// A launcher whose executable never exists.
    pub fn missing() -> Self {
        Self {
            missing: true,
            ..Self::sequence(Vec::new())
        }
    }

    /// Argument vectors passed to `launch`, in order.
    pub fn launched(&self) -> Vec<Vec<String>> {
        self.launched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Graceful terminate requests received by launched children.
    pub fn terminate_requests(&self) -> usize {
        self.counters.terminate.load(Ordering::SeqCst)
    }

    /// Forced kills received by launched children.
    pub fn kill_requests(&self) -> usize {
        self.counters.kill.load(Ordering::SeqCst)
    }

    fn next_script(&self) -> Option<ReplayScript> {
        let mut scripts = self.scripts.lock().unwrap_or_else(PoisonError::into_inner);
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(script) = scripts.pop_front() {
            *last = Some(script.clone());
            return Some(script);
        }
        last.clone()
    }
}

#[async_trait]
impl ProcessLauncher for ReplayLauncher {
    async fn launch(&self, argv: &[String]) -> Result<Box<dyn ChildProcess>, LaunchError> {
        let program = argv.first().ok_or(LaunchError::EmptyCommand)?;
        self.launched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(argv.to_vec());

        if self.missing {
            return Err(LaunchError::NotFound(program.clone()));
        }
        let script = self.next_script().ok_or_else(|| LaunchError::Spawn {
            program: program.clone(),
            source: io::Error::other("no replay script queued"),
        })?;

        Ok(Box::new(ReplayChild {
            chunks: script.chunks.into(),
            exit_code: script.exit_code,
            hang_after_output: script.hang_after_output,
            hang_on_exit: script.hang_on_exit,
            ignore_terminate: script.ignore_terminate,
            terminated: false,
            killed: false,
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct ReplayChild {
    chunks: VecDeque<Vec<u8>>,
    exit_code: Option<i32>,
    hang_after_output: bool,
    hang_on_exit: bool,
    ignore_terminate: bool,
    terminated: bool,
    killed: bool,
    counters: Arc<Counters>,
}

impl ReplayChild {
    const fn stopped(&self) -> bool {
        self.killed || (self.terminated && !self.ignore_terminate)
    }
}

#[async_trait]
impl ChildProcess for ReplayChild {
    fn id(&self) -> Option<u32> {
        None
    }

    async fn read_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
        if self.stopped() {
            return Ok(None);
        }
        if let Some(chunk) = self.chunks.pop_front() {
            return Ok(Some(chunk));
        }
        if self.hang_after_output {
            std::future::pending::<()>().await;
        }
        Ok(None)
    }

    async fn wait(&mut self) -> io::Result<Option<i32>> {
        if self.stopped() {
            return Ok(None);
        }
        if self.hang_on_exit || self.hang_after_output {
            std::future::pending::<()>().await;
        }
        Ok(self.exit_code)
    }

    async fn terminate(&mut self) -> io::Result<()> {
        self.counters.terminate.fetch_add(1, Ordering::SeqCst);
        self.terminated = true;
        Ok(())
    }

    async fn kill(&mut self) -> io::Result<()> {
        self.counters.kill.fetch_add(1, Ordering::SeqCst);
        self.killed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    async fn drain(child: &mut dyn ChildProcess) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = child.read_chunk().await.unwrap() {
            out.extend(chunk);
        }
        out
    }

    #[tokio::test]
    async fn test_script_plays_back_in_order() {
        let launcher =
            ReplayLauncher::new(ReplayScript::new().line("a").raw(b"b\r".to_vec()).exit_code(2));
        let argv = vec!["tdl".to_string(), "dl".to_string()];
        let mut child = launcher.launch(&argv).await.unwrap();

        assert_eq!(drain(child.as_mut()).await, b"a\nb\r");
        assert_eq!(child.wait().await.unwrap(), Some(2));
        assert_eq!(launcher.launched(), vec![argv]);
    }

    #[tokio::test]
    async fn test_sequence_repeats_last_script() {
        let launcher = ReplayLauncher::sequence(vec![
            ReplayScript::new().exit_code(0),
            ReplayScript::new().exit_code(7),
        ]);
        let argv = vec!["tdl".to_string()];
        let mut codes = Vec::new();
        for _ in 0..3 {
            let mut child = launcher.launch(&argv).await.unwrap();
            codes.push(child.wait().await.unwrap());
        }
        assert_eq!(codes, vec![Some(0), Some(7), Some(7)]);
    }

    #[tokio::test]
    async fn test_missing_launcher_reports_not_found() {
        let launcher = ReplayLauncher::missing();
        let result = launcher.launch(&["tdl".to_string()]).await;
        assert!(matches!(result, Err(LaunchError::NotFound(p)) if p == "tdl"));
        assert_eq!(launcher.launched().len(), 1);
    }

    #[tokio::test]
    async fn test_terminate_stops_a_hanging_child() {
        let launcher = ReplayLauncher::new(ReplayScript::new().hang_on_exit());
        let mut child = launcher.launch(&["tdl".to_string()]).await.unwrap();
        assert!(drain(child.as_mut()).await.is_empty());

        child.terminate().await.unwrap();
        assert_eq!(child.wait().await.unwrap(), None);
        assert_eq!(launcher.terminate_requests(), 1);
    }

    #[tokio::test]
    async fn test_transcript_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"x ... done! [1 MB in 1s; 1 MB/s]\n").unwrap();

        let script = ReplayScript::from_transcript_file(file.path()).unwrap();
        let launcher = ReplayLauncher::new(script);
        let mut child = launcher.launch(&["tdl".to_string()]).await.unwrap();
        assert_eq!(drain(child.as_mut()).await, b"x ... done! [1 MB in 1s; 1 MB/s]\n");
    }
}
