use log::{debug, warn};
use serde::Deserialize;
use sonoscope_messages::SampleBatch;

/// Largest number of bytes retained while waiting for a frame delimiter.
/// The device's biggest legitimate frame is a few KiB, so a buffer this far
/// past that means the stream is garbage and gets cleared.
pub const MAX_PENDING_BYTES: usize = 256 * 1024;

/// The structured wire record sent by the firmware's JSON path.
#[derive(Deserialize)]
struct AudioRecord {
    audio_data: Vec<i32>,
}

/// Reassembles newline-delimited frames from arbitrarily chunked bytes and
/// decodes each complete frame into a batch of samples.
///
/// Feeding is restartable: each call returns only the batches completed by
/// the newly fed bytes, and incomplete trailing data is retained for the
/// next call. Malformed lines are dropped with a diagnostic, never surfaced
/// as errors.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    pending: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw chunk; returns the decoded batches in arrival order.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SampleBatch> {
        self.pending.extend_from_slice(bytes);

        let mut batches = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            // Strip the delimiter; the rest is one candidate frame.
            match std::str::from_utf8(&line[..line.len() - 1]) {
                Ok(text) => {
                    if let Some(batch) = decode_line(text.trim()) {
                        batches.push(batch);
                    }
                }
                Err(_) => debug!("dropping non-UTF-8 line ({} bytes)", line.len() - 1),
            }
        }

        if self.pending.len() > MAX_PENDING_BYTES {
            warn!(
                "no frame delimiter in {} buffered bytes, clearing buffer",
                self.pending.len()
            );
            self.pending.clear();
        }

        batches
    }

    /// Number of bytes held back waiting for a delimiter.
    pub fn pending_bytes(&self) -> usize {
        self.pending.len()
    }
}

/// Decode one trimmed line as the JSON record or, failing that, as a raw
/// comma-separated list. Returns `None` when the line is empty, matches
/// neither shape, or decodes to an empty batch.
fn decode_line(line: &str) -> Option<SampleBatch> {
    if line.is_empty() {
        return None;
    }

    if let Ok(record) = serde_json::from_str::<AudioRecord>(line) {
        if record.audio_data.is_empty() {
            return None;
        }
        return Some(record.audio_data);
    }

    let parsed: Result<SampleBatch, _> = line
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::parse::<i32>)
        .collect();

    match parsed {
        Ok(batch) if !batch.is_empty() => Some(batch),
        Ok(_) => None,
        Err(_) => {
            // One bad token discards the whole line.
            let head: String = line.chars().take(50).collect();
            debug!("dropping undecodable line: {head}...");
            None
        }
    }
}
