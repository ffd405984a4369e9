//! Line-oriented output for pipes and log files.

use std::io::{self, Write};
use std::time::Duration;

use tdlrun_core::RunEvent;

use super::throttle::KeyedThrottle;

const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);
const AGGREGATE_KEY: &str = "\0overall";
const STATS_KEY: &str = "\0stats";

/// Prints one line per event, throttling repetitive progress.
pub struct PlainRenderer<W: Write> {
    out: W,
    throttle: KeyedThrottle,
}

impl PlainRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> PlainRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            throttle: KeyedThrottle::new(PROGRESS_INTERVAL),
        }
    }

    pub fn render(&mut self, event: &RunEvent) -> io::Result<()> {
        match event {
            RunEvent::Log { line } => writeln!(self.out, "{line}"),
            RunEvent::FileStarted { id } => writeln!(self.out, "started  {id}"),
            RunEvent::FileProgress {
                id,
                percent,
                size_info,
                eta,
                speed,
            } => {
                if !self.throttle.should_emit(id) {
                    return Ok(());
                }
                writeln!(
                    self.out,
                    "progress {id} {percent:5.1}% [{size_info}; ETA {eta}; {speed}]"
                )
            }
            RunEvent::FileFinished {
                id,
                size_info,
                speed,
            } => {
                self.throttle.forget(id);
                writeln!(self.out, "finished {id} [{size_info}; {speed}]")
            }
            RunEvent::AggregateProgress {
                percent,
                elapsed,
                speed,
            } => {
                if *percent < 100 && !self.throttle.should_emit(AGGREGATE_KEY) {
                    return Ok(());
                }
                writeln!(self.out, "overall  {percent:>3}% [{elapsed}; {speed}]")
            }
            RunEvent::ResourceStats {
                cpu_percent,
                memory,
                goroutines,
            } => {
                if !self.throttle.should_emit(STATS_KEY) {
                    return Ok(());
                }
                writeln!(
                    self.out,
                    "stats    cpu {cpu_percent:.2}% memory {memory} goroutines {goroutines}"
                )
            }
            RunEvent::RunSucceeded { .. } | RunEvent::RunFailed { .. } | RunEvent::RunCancelled => {
                Ok(())
            }
        }
    }

    pub fn finish(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_all(events: &[RunEvent]) -> String {
        let mut renderer = PlainRenderer::new(Vec::new());
        for event in events {
            renderer.render(event).unwrap();
        }
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    fn progress(id: &str, percent: f64) -> RunEvent {
        RunEvent::FileProgress {
            id: id.into(),
            percent,
            size_info: "1 MB in 1s".into(),
            eta: "N/A".into(),
            speed: "1 MB/s".into(),
        }
    }

    #[test]
    fn test_file_lifecycle_lines() {
        let out = render_all(&[
            RunEvent::FileStarted { id: "a".into() },
            progress("a", 10.0),
            progress("a", 20.0),
            RunEvent::FileFinished {
                id: "a".into(),
                size_info: "2 MB in 2s".into(),
                speed: "1 MB/s".into(),
            },
        ]);
        assert_eq!(
            out,
            "started  a\n\
             progress a  10.0% [1 MB in 1s; ETA N/A; 1 MB/s]\n\
             finished a [2 MB in 2s; 1 MB/s]\n"
        );
    }

    #[test]
    fn test_complete_aggregate_always_printed() {
        let aggregate = |percent| RunEvent::AggregateProgress {
            percent,
            elapsed: "1s".into(),
            speed: "1 MB/s".into(),
        };
        let out = render_all(&[aggregate(40), aggregate(50), aggregate(100)]);
        assert_eq!(out.lines().count(), 2);
        assert!(out.ends_with("overall  100% [1s; 1 MB/s]\n"));
    }

    #[test]
    fn test_log_lines_verbatim_and_terminal_silent() {
        let out = render_all(&[
            RunEvent::Log {
                line: "panic: invalid expression".into(),
            },
            RunEvent::RunCancelled,
        ]);
        assert_eq!(out, "panic: invalid expression\n");
    }
}
