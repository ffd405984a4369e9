//! Event rendering for the terminal.
//!
//! - `fancy` - indicatif bars when stdout is a terminal
//! - `plain` - throttled text lines for pipes
//! - `json` - one JSON event per line

mod fancy;
mod json;
mod plain;
mod throttle;

use std::io::{self, IsTerminal};

use tdlrun_core::RunEvent;
use tracing::warn;

pub use fancy::FancyRenderer;
pub use json::JsonRenderer;
pub use plain::PlainRenderer;

/// Output format requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Bars on a terminal, plain lines otherwise.
    Auto,
    Json,
}

/// Renderer that automatically selects terminal or plain output.
pub enum Renderer {
    Fancy(FancyRenderer),
    Plain(PlainRenderer<io::Stdout>),
    Json(JsonRenderer<io::Stdout>),
}

impl Renderer {
    pub fn new(mode: OutputMode) -> Self {
        match mode {
            OutputMode::Json => Self::Json(JsonRenderer::stdout()),
            OutputMode::Auto if io::stdout().is_terminal() => Self::Fancy(FancyRenderer::new()),
            OutputMode::Auto => Self::Plain(PlainRenderer::stdout()),
        }
    }

    pub fn render(&mut self, event: &RunEvent) {
        let result = match self {
            Self::Fancy(inner) => inner.render(event),
            Self::Plain(inner) => inner.render(event),
            Self::Json(inner) => inner.render(event),
        };
        if let Err(e) = result {
            warn!(error = %e, "failed to write event");
        }
    }

    pub fn finish(&mut self) {
        let result = match self {
            Self::Fancy(inner) => {
                inner.finish();
                Ok(())
            }
            Self::Plain(inner) => inner.finish(),
            Self::Json(inner) => inner.finish(),
        };
        if let Err(e) = result {
            warn!(error = %e, "failed to flush output");
        }
    }

    /// Whether terminal events already carry everything (no extra summary).
    pub const fn is_machine_readable(&self) -> bool {
        matches!(self, Self::Json(_))
    }
}
