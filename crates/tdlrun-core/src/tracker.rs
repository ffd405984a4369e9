//! Per-run progress state machine.
//!
//! Each file identifier moves `Unseen -> Active -> Done`. The first sighting
//! (progress or completion) emits `FileStarted` exactly once; a completion
//! line emits `FileFinished` and is terminal for that identifier. Duplicate
//! completion lines repeat `FileFinished` without repeating `FileStarted`,
//! and progress lines for a finished file are ignored.
//!
//! A tracker belongs to exactly one run; never reuse one across runs.

use indexmap::IndexMap;
use tracing::trace;

use crate::classify::ClassifiedLine;
use crate::events::RunEvent;
use crate::run::FileTransferState;

/// Converts classified lines into run events.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    files: IndexMap<String, FileTransferState>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one classified line, returning the events it produces in order.
    pub fn observe(&mut self, line: ClassifiedLine) -> Vec<RunEvent> {
        match line {
            ClassifiedLine::FileProgress {
                id,
                percent,
                size_info,
                eta,
                speed,
            } => {
                let mut events = Vec::with_capacity(2);
                let state = self.enter(&id, &mut events);
                if state.done {
                    trace!(file_id = %id, "ignoring progress for finished file");
                    return events;
                }
                state.percent = percent;
                state.size_info.clone_from(&size_info);
                state.eta.clone_from(&eta);
                state.speed.clone_from(&speed);
                events.push(RunEvent::FileProgress {
                    id,
                    percent,
                    size_info,
                    eta,
                    speed,
                });
                events
            }

            ClassifiedLine::FileDone {
                id,
                size_info,
                speed,
            } => {
                let mut events = Vec::with_capacity(2);
                let state = self.enter(&id, &mut events);
                state.percent = 100.0;
                state.done = true;
                state.size_info.clone_from(&size_info);
                state.speed.clone_from(&speed);
                state.eta.clear();
                events.push(RunEvent::FileFinished {
                    id,
                    size_info,
                    speed,
                });
                events
            }

            ClassifiedLine::AggregateProgress {
                percent,
                elapsed,
                speed,
            } => vec![RunEvent::AggregateProgress {
                percent,
                elapsed,
                speed,
            }],

            ClassifiedLine::ResourceStats {
                cpu_percent,
                memory,
                goroutines,
            } => vec![RunEvent::ResourceStats {
                cpu_percent,
                memory,
                goroutines,
            }],

            ClassifiedLine::PlainText { text } => vec![RunEvent::Log { line: text }],
        }
    }

    /// Look up a file, registering it (and emitting `FileStarted`) on first sight.
    fn enter(&mut self, id: &str, events: &mut Vec<RunEvent>) -> &mut FileTransferState {
        if !self.files.contains_key(id) {
            events.push(RunEvent::FileStarted { id: id.to_string() });
        }
        self.files
            .entry(id.to_string())
            .or_insert_with(|| FileTransferState::new(id))
    }

    /// Every file seen so far, in first-seen order.
    pub fn files(&self) -> impl Iterator<Item = &FileTransferState> {
        self.files.values()
    }

    pub fn file(&self, id: &str) -> Option<&FileTransferState> {
        self.files.get(id)
    }

    /// Files seen but not yet finished.
    pub fn active_count(&self) -> usize {
        self.files.values().filter(|f| !f.done).count()
    }

    pub fn finished_count(&self) -> usize {
        self.files.values().filter(|f| f.done).count()
    }
}
