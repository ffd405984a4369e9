//! Line assembly and cleaning for raw tool output.
//!
//! `tdl` writes progress with carriage-return redraws and ANSI cursor
//! movement, and may emit bytes that are not valid UTF-8. Bytes are buffered
//! until a line boundary (`\n`, `\r\n` or a lone `\r`) and only then decoded,
//! so a multi-byte character split across two reads is never mangled.

/// Reassembles arbitrarily split byte chunks into complete raw lines.
#[derive(Debug, Default)]
pub struct LineAssembler {
    partial: Vec<u8>,
    /// The previous chunk ended on `\r`; a leading `\n` belongs to it.
    after_cr: bool,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk, returning every line it completes (terminators removed).
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        let mut lines = Vec::new();
        for &byte in chunk {
            if self.after_cr {
                self.after_cr = false;
                if byte == b'\n' {
                    continue;
                }
            }
            match byte {
                b'\n' => lines.push(std::mem::take(&mut self.partial)),
                b'\r' => {
                    lines.push(std::mem::take(&mut self.partial));
                    self.after_cr = true;
                }
                _ => self.partial.push(byte),
            }
        }
        lines
    }

    /// Flush the trailing unterminated line once the stream has closed.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        self.after_cr = false;
        if self.partial.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.partial))
        }
    }
}

/// Decode one raw line, strip terminal control sequences and trim it.
///
/// Invalid UTF-8 is replaced with U+FFFD rather than rejected. Returns `None`
/// for lines that are blank once cleaned.
pub fn clean_line(raw: &[u8]) -> Option<String> {
    let decoded = String::from_utf8_lossy(raw);
    let stripped = if decoded.contains('\u{1b}') {
        strip_ansi_escapes::strip_str(&decoded)
    } else {
        decoded.into_owned()
    };
    let trimmed = stripped.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
