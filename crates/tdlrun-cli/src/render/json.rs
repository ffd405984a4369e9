//! JSON Lines output: one serialized event per line.

use std::io::{self, Write};

use tdlrun_core::RunEvent;

pub struct JsonRenderer<W: Write> {
    out: W,
}

impl JsonRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonRenderer<W> {
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    pub fn render(&mut self, event: &RunEvent) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, event)?;
        self.out.write_all(b"\n")
    }

    pub fn finish(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_event_per_line() {
        let mut renderer = JsonRenderer::new(Vec::new());
        renderer
            .render(&RunEvent::FileStarted { id: "a".into() })
            .unwrap();
        renderer.render(&RunEvent::RunCancelled).unwrap();

        let out = String::from_utf8(renderer.out).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                r#"{"type":"file_started","id":"a"}"#,
                r#"{"type":"run_cancelled"}"#
            ]
        );
    }
}
