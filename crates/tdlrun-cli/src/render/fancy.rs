//! Terminal progress bars (indicatif).

use std::collections::{HashMap, VecDeque};
use std::io;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use tdlrun_core::RunEvent;

/// File bars count in tenths of a percent.
const FILE_BAR_LENGTH: u64 = 1000;
const MAX_LABEL: usize = 40;
/// Finished bars kept on screen; older ones are cleared.
const MAX_FINISHED_BARS: usize = 5;

/// One bar per file plus an overall bar, with log lines printed above.
pub struct FancyRenderer {
    multi: MultiProgress,
    files: HashMap<String, ProgressBar>,
    finished: VecDeque<String>,
    overall: Option<ProgressBar>,
    stats: Option<String>,
}

impl FancyRenderer {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::stdout()),
            files: HashMap::new(),
            finished: VecDeque::new(),
            overall: None,
            stats: None,
        }
    }

    pub fn render(&mut self, event: &RunEvent) -> io::Result<()> {
        match event {
            RunEvent::Log { line } => return self.multi.println(line),
            RunEvent::FileStarted { id } => {
                let bar = self.multi.add(ProgressBar::new(FILE_BAR_LENGTH));
                bar.set_style(file_style());
                bar.set_prefix(format_label(id));
                self.files.insert(id.clone(), bar);
            }
            RunEvent::FileProgress {
                id,
                percent,
                size_info,
                eta,
                speed,
            } => {
                if let Some(bar) = self.files.get(id) {
                    bar.set_position(permille(*percent));
                    bar.set_message(format!("{size_info} · ETA {eta} · {speed}"));
                }
            }
            RunEvent::FileFinished {
                id,
                size_info,
                speed,
            } => {
                if let Some(bar) = self.files.get(id) {
                    bar.set_position(FILE_BAR_LENGTH);
                    bar.finish_with_message(format!("done · {size_info} · {speed}"));
                    self.finished.push_back(id.clone());
                    self.evict_finished();
                }
            }
            RunEvent::AggregateProgress {
                percent,
                elapsed,
                speed,
            } => {
                let bar = self.overall_bar();
                bar.set_position(u64::from(*percent));
                bar.set_prefix(format!("overall {elapsed} · {speed}"));
            }
            RunEvent::ResourceStats {
                cpu_percent,
                memory,
                goroutines,
            } => {
                let stats = format!("cpu {cpu_percent:.1}% · mem {memory} · {goroutines} goroutines");
                if let Some(bar) = &self.overall {
                    bar.set_message(stats.clone());
                }
                self.stats = Some(stats);
            }
            RunEvent::RunSucceeded { .. } | RunEvent::RunFailed { .. } | RunEvent::RunCancelled => {}
        }
        Ok(())
    }

    fn evict_finished(&mut self) {
        while self.finished.len() > MAX_FINISHED_BARS {
            let Some(id) = self.finished.pop_front() else {
                break;
            };
            // The id may have been restarted by a later task.
            if self.files.get(&id).is_some_and(ProgressBar::is_finished) {
                if let Some(bar) = self.files.remove(&id) {
                    self.multi.remove(&bar);
                }
            }
        }
    }

    fn overall_bar(&mut self) -> &ProgressBar {
        let multi = &self.multi;
        let stats = self.stats.as_deref();
        self.overall.get_or_insert_with(|| {
            let bar = multi.insert(0, ProgressBar::new(100));
            bar.set_style(overall_style());
            if let Some(stats) = stats {
                bar.set_message(stats.to_string());
            }
            bar
        })
    }

    /// Leave finished bars on screen and drop unfinished ones.
    pub fn finish(&mut self) {
        for bar in self.files.values() {
            if !bar.is_finished() {
                bar.abandon();
            }
        }
        if let Some(bar) = &self.overall {
            bar.finish();
        }
    }
}

impl Default for FancyRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn file_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:40} {bar:28.cyan/blue} {percent:>3}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##.")
}

fn overall_style() -> ProgressStyle {
    ProgressStyle::with_template("{bar:40.green/white} {pos:>3}% {prefix} {msg:.dim}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##.")
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn permille(percent: f64) -> u64 {
    (percent.clamp(0.0, 100.0) * 10.0).round() as u64
}

fn format_label(raw: &str) -> String {
    let char_count = raw.chars().count();
    if char_count <= MAX_LABEL {
        return raw.to_string();
    }
    // Truncate to MAX_LABEL - 1 chars and add ellipsis
    let mut buf: String = raw.chars().take(MAX_LABEL - 1).collect();
    buf.push('…');
    buf
}
