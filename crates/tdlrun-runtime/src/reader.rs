//! Line reader over a child's merged output.

use std::collections::VecDeque;
use std::io;

use tdlrun_core::ports::ChildProcess;
use tdlrun_core::text::{LineAssembler, clean_line};

/// Yields cleaned, non-blank lines from a child process.
///
/// `next_line` is cancel-safe: dropping it mid-read loses no output.
pub struct LineReader {
    child: Box<dyn ChildProcess>,
    assembler: LineAssembler,
    pending: VecDeque<Vec<u8>>,
    eof: bool,
}

impl LineReader {
    pub fn new(child: Box<dyn ChildProcess>) -> Self {
        Self {
            child,
            assembler: LineAssembler::new(),
            pending: VecDeque::new(),
            eof: false,
        }
    }

    /// Next line, or `None` once the output stream has closed.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        loop {
            while let Some(raw) = self.pending.pop_front() {
                if let Some(line) = clean_line(&raw) {
                    return Ok(Some(line));
                }
            }
            if self.eof {
                return Ok(None);
            }
            match self.child.read_chunk().await? {
                Some(chunk) => self.pending.extend(self.assembler.push(&chunk)),
                None => {
                    self.eof = true;
                    self.pending.extend(self.assembler.finish());
                }
            }
        }
    }

    /// The underlying child, for waiting on or stopping it.
    pub fn child_mut(&mut self) -> &mut dyn ChildProcess {
        self.child.as_mut()
    }
}
