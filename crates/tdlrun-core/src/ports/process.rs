//! Process launcher port.
//!
//! Abstracts the OS process facility so runs can be driven by real `tdl`
//! processes, recorded transcripts, or test doubles.

use std::io;

use async_trait::async_trait;

use super::LaunchError;

/// Starts child processes from an argument vector.
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    /// Spawn `argv[0]` with the remaining arguments.
    async fn launch(&self, argv: &[String]) -> Result<Box<dyn ChildProcess>, LaunchError>;
}

/// A running child with one merged stdout/stderr stream.
///
/// # Design Rules
///
/// - `read_chunk` yields raw bytes in emission order; splits are arbitrary
/// - `terminate` is a graceful request, `kill` is forced
/// - `wait` reaps the child; it must be called on every exit path
#[async_trait]
pub trait ChildProcess: Send {
    /// OS process id, if there is one.
    fn id(&self) -> Option<u32>;

    /// Next chunk of merged output, `None` once every stream has closed.
    async fn read_chunk(&mut self) -> io::Result<Option<Vec<u8>>>;

    /// Wait for exit. `None` means the child had no exit code (killed by a signal).
    async fn wait(&mut self) -> io::Result<Option<i32>>;

    /// Ask the child to exit.
    async fn terminate(&mut self) -> io::Result<()>;

    /// Force the child to exit.
    async fn kill(&mut self) -> io::Result<()>;
}
