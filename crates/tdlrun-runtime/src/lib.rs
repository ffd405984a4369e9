//! Process runtime for tdlrun: launching `tdl`, reading its output and
//! driving runs to a terminal outcome.

#![deny(unsafe_code)]

mod locate;
pub mod process;
mod reader;
mod runner;
mod worker;

pub use locate::{ExecutableSource, LocateError, LocatedExecutable, locate_tdl};
pub use process::{ReplayLauncher, ReplayScript, TokioProcessLauncher};
pub use reader::LineReader;
pub use runner::{RunHandle, TaskRunner};
