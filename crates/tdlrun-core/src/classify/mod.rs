//! Classification of cleaned `tdl` output lines.
//!
//! Every line maps to exactly one [`ClassifiedLine`]. Grammars are tried in a
//! fixed priority order and the first match wins:
//!
//! 1. completion - `<id> ... done! [<size> in <dur>; <speed>]`
//! 2. progress - `<id> ... <pct>% [bar]? [<size> in <dur>; ETA: <eta>; <speed>]`
//! 3. aggregate - `[####......] [<elapsed>; <speed>]`
//! 4. stats - `CPU: <pct>% Memory: <val> <unit> Goroutines: <n>`
//!
//! Anything else is [`ClassifiedLine::PlainText`]. Classification never
//! fails: a line that has the right shape but carries an unparsable number
//! is treated as not matching that grammar.

mod grammars;

use serde::{Deserialize, Serialize};

/// ETA reported when a progress line carries no ETA field.
pub const ETA_NOT_AVAILABLE: &str = "N/A";

/// One output line, tagged by the grammar it matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifiedLine {
    /// A single file is still transferring.
    FileProgress {
        id: String,
        percent: f64,
        size_info: String,
        eta: String,
        speed: String,
    },
    /// A single file has finished transferring.
    FileDone {
        id: String,
        size_info: String,
        speed: String,
    },
    /// Overall batch progress, derived from the marker bar.
    AggregateProgress {
        percent: u8,
        elapsed: String,
        speed: String,
    },
    /// Periodic resource usage of the tool itself.
    ResourceStats {
        cpu_percent: f64,
        memory: String,
        goroutines: u32,
    },
    /// Anything else; forwarded to the log verbatim.
    PlainText { text: String },
}

impl ClassifiedLine {
    /// File identifier carried by per-file variants.
    pub fn file_id(&self) -> Option<&str> {
        match self {
            Self::FileProgress { id, .. } | Self::FileDone { id, .. } => Some(id),
            _ => None,
        }
    }
}

/// Classify one cleaned line.
pub fn classify_line(line: &str) -> ClassifiedLine {
    grammars::match_done(line)
        .or_else(|| grammars::match_progress(line))
        .or_else(|| grammars::match_aggregate(line))
        .or_else(|| grammars::match_stats(line))
        .unwrap_or_else(|| ClassifiedLine::PlainText {
            text: line.to_string(),
        })
}

/// Percentage of filled markers in an aggregate bar, truncated.
///
/// An empty bar is 0%, never a division by zero.
pub fn bar_percent(filled: usize, empty: usize) -> u8 {
    let total = filled + empty;
    if total == 0 {
        return 0;
    }
    u8::try_from(filled * 100 / total).unwrap_or(100)
}
