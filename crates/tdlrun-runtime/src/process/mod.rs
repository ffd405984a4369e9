//! Process launching and lifecycle.
//!
//! - `launcher` - tokio implementation of the launcher port
//! - `stream` - pipe readers merging stdout and stderr
//! - `shutdown` - terminate → kill escalation
//! - `replay` - scripted launcher for tests and `--replay`

mod launcher;
mod replay;
mod shutdown;
mod stream;

pub use launcher::TokioProcessLauncher;
pub use replay::{ReplayLauncher, ReplayScript};
pub use shutdown::{force_kill, shutdown_child};
