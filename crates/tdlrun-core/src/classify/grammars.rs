//! Compiled line grammars, one matcher per [`ClassifiedLine`] variant.

use std::sync::LazyLock;

use regex::Regex;

use super::{ClassifiedLine, ETA_NOT_AVAILABLE, bar_percent};

// `tdl` separates identifier and status with "..."; some renderings use "…".
static DONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<file_id>.+?)\s+(?:\.{3}|…)\s+done!\s*\[(?P<size_info>.+? in .+?);\s*(?P<speed>.+?)\]",
    )
    .expect("completion grammar compiles")
});

static PROGRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?P<file_id>.+?)\s+(?:\.{3}|…)\s+",
        r"(?P<percent>[0-9.]+)%\s*",
        r"(?:\[[^\]]*\]\s*)?",
        r"\[(?P<size_info>.+? in .+?);\s*(?:~?ETA:\s*(?P<eta>.+?);\s*)?(?P<speed>.+?)\]",
    ))
    .expect("progress grammar compiles")
});

static AGGREGATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(?P<filled>#*)(?P<empty>\.*)\]\s+\[(?P<elapsed>.+?);\s*(?P<speed>.+?)\]")
        .expect("aggregate grammar compiles")
});

static STATS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"CPU:\s*(?P<cpu>[0-9.]+)%\s+",
        r"Memory:\s*(?P<mem>[0-9.]+\s+\w+)\s+",
        r"Goroutines:\s*(?P<goroutines>[0-9]+)",
    ))
    .expect("stats grammar compiles")
});

pub(super) fn match_done(line: &str) -> Option<ClassifiedLine> {
    let caps = DONE_RE.captures(line)?;
    Some(ClassifiedLine::FileDone {
        id: caps["file_id"].trim().to_string(),
        size_info: caps["size_info"].to_string(),
        speed: caps["speed"].trim().to_string(),
    })
}

pub(super) fn match_progress(line: &str) -> Option<ClassifiedLine> {
    let caps = PROGRESS_RE.captures(line)?;
    let percent = caps["percent"].parse::<f64>().ok()?;
    let eta = caps
        .name("eta")
        .map_or(ETA_NOT_AVAILABLE, |m| m.as_str().trim());
    Some(ClassifiedLine::FileProgress {
        id: caps["file_id"].trim().to_string(),
        percent,
        size_info: caps["size_info"].to_string(),
        eta: eta.to_string(),
        speed: caps["speed"].trim().to_string(),
    })
}

pub(super) fn match_aggregate(line: &str) -> Option<ClassifiedLine> {
    let caps = AGGREGATE_RE.captures(line)?;
    Some(ClassifiedLine::AggregateProgress {
        percent: bar_percent(caps["filled"].len(), caps["empty"].len()),
        elapsed: caps["elapsed"].trim().to_string(),
        speed: caps["speed"].trim().to_string(),
    })
}

pub(super) fn match_stats(line: &str) -> Option<ClassifiedLine> {
    let caps = STATS_RE.captures(line)?;
    let cpu_percent = caps["cpu"].parse::<f64>().ok()?;
    let goroutines = caps["goroutines"].parse::<u32>().ok()?;
    Some(ClassifiedLine::ResourceStats {
        cpu_percent,
        memory: caps["mem"].to_string(),
        goroutines,
    })
}
