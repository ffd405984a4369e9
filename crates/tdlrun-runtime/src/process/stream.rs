//! Async pipe readers feeding one merged output channel.
//!
//! `tdl` writes progress to stderr and results to stdout, and a subscriber
//! needs both in emission order. Each pipe gets its own reader task; both
//! send into one channel. A reader only forwards bytes up to the last line
//! terminator it has seen, so a line from one pipe is never split by bytes
//! from the other. Bytes are forwarded raw; decoding happens downstream.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tracing::debug;

/// Chunk (or read error) travelling from a pipe reader to the child handle.
pub type ChunkResult = io::Result<Vec<u8>>;

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// A partial line longer than this is forwarded without waiting for its end.
const MAX_HELD_BYTES: usize = 64 * 1024;

pub fn spawn_stream_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    stream_type: &'static str,
    tx: mpsc::Sender<ChunkResult>,
) {
    tokio::spawn(async move {
        let mut stream = stream;
        let mut buf = vec![0_u8; READ_BUFFER_SIZE];
        let mut held: Vec<u8> = Vec::new();

        loop {
            match stream.read(&mut buf).await {
                Ok(0) => break, // EOF
                Ok(n) => {
                    held.extend_from_slice(&buf[..n]);
                    let ready = match last_terminator(&held) {
                        Some(end) => held.drain(..=end).collect(),
                        None if held.len() > MAX_HELD_BYTES => std::mem::take(&mut held),
                        None => continue,
                    };
                    if tx.send(Ok(ready)).await.is_err() {
                        debug!(%stream_type, "output receiver dropped, reader exiting");
                        return;
                    }
                }
                Err(e) => {
                    debug!(%stream_type, error = %e, "output reader exiting due to read error");
                    let _ = tx.send(Err(e)).await;
                    return;
                }
            }
        }

        if !held.is_empty() {
            let _ = tx.send(Ok(held)).await;
        }
        debug!(%stream_type, "output reader task exiting");
    });
}

fn last_terminator(bytes: &[u8]) -> Option<usize> {
    bytes.iter().rposition(|&b| b == b'\n' || b == b'\r')
}
