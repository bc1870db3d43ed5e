use std::io::Write;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info};
use rand::Rng;
use serde_json::json;

use crate::analysis::SAMPLE_RATE;

/// Payload shape of a simulator frame, matching the firmware's two senders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireFormat {
    /// `{"audio_data":[...]}` per line.
    #[default]
    Json,
    /// Raw comma-separated integers per line.
    Csv,
}

const TONE_HZ: f32 = 440.0;
const AMPLITUDE: f32 = 1000.0;
const NOISE_RANGE: i32 = 100;
const BATCH_SIZE: usize = 1024;
const SEND_INTERVAL: Duration = Duration::from_millis(10);

/// Stand-in for the streaming device: a TCP server sending newline-framed
/// batches of a noisy 440 Hz sine to every client. Useful for demos and
/// tests when no hardware is on the network.
pub struct AudioSimulator {
    listener: TcpListener,
    format: WireFormat,
}

impl AudioSimulator {
    pub fn bind(addr: &str, format: WireFormat) -> Result<Self> {
        let listener =
            TcpListener::bind(addr).with_context(|| format!("binding simulator to {addr}"))?;
        Ok(Self { listener, format })
    }

    /// Address actually bound, for `bind("127.0.0.1:0", ..)` callers.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("reading simulator address")
    }

    /// Accept clients forever, streaming to each on its own thread.
    pub fn run(self) -> Result<()> {
        info!("simulator listening on {}", self.local_addr()?);
        for stream in self.listener.incoming() {
            let stream = stream.context("accepting simulator client")?;
            let format = self.format;
            thread::spawn(move || {
                if let Err(e) = serve_client(stream, format) {
                    debug!("simulator client gone: {e}");
                }
            });
        }
        Ok(())
    }
}

fn serve_client(mut stream: TcpStream, format: WireFormat) -> Result<()> {
    info!("simulator client connected: {}", stream.peer_addr()?);
    let mut clock = 0u64;
    loop {
        let batch = generate_batch(&mut clock);
        stream.write_all(encode_frame(&batch, format).as_bytes())?;
        thread::sleep(SEND_INTERVAL);
    }
}

/// One batch of the tone plus uniform noise; `clock` carries sine phase
/// continuity across batches.
fn generate_batch(clock: &mut u64) -> Vec<i32> {
    let mut rng = rand::thread_rng();
    (0..BATCH_SIZE)
        .map(|_| {
            let t = *clock as f32 / SAMPLE_RATE.as_hz() as f32;
            *clock += 1;
            let tone = AMPLITUDE * (2.0 * std::f32::consts::PI * TONE_HZ * t).sin();
            tone as i32 + rng.gen_range(-NOISE_RANGE..=NOISE_RANGE)
        })
        .collect()
}

fn encode_frame(batch: &[i32], format: WireFormat) -> String {
    match format {
        WireFormat::Json => format!("{}\n", json!({ "audio_data": batch })),
        WireFormat::Csv => {
            let tokens: Vec<String> = batch.iter().map(i32::to_string).collect();
            format!("{}\n", tokens.join(","))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::FrameDecoder;

    #[test]
    fn test_generated_batch_stays_in_amplitude_bounds() {
        let mut clock = 0;
        let batch = generate_batch(&mut clock);
        assert_eq!(batch.len(), BATCH_SIZE);
        let bound = AMPLITUDE as i32 + NOISE_RANGE;
        assert!(batch.iter().all(|&s| s.abs() <= bound));
        assert_eq!(clock, BATCH_SIZE as u64);
    }

    #[test]
    fn test_json_frame_decodes_back() {
        let batch = vec![1, -2, 3];
        let mut decoder = FrameDecoder::new();
        let decoded = decoder.feed(encode_frame(&batch, WireFormat::Json).as_bytes());
        assert_eq!(decoded, vec![batch]);
    }

    #[test]
    fn test_csv_frame_decodes_back() {
        let batch = vec![10, 0, -30];
        let mut decoder = FrameDecoder::new();
        let decoded = decoder.feed(encode_frame(&batch, WireFormat::Csv).as_bytes());
        assert_eq!(decoded, vec![batch]);
    }
}
