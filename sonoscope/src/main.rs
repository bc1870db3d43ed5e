use std::thread;
use std::time::{Duration, Instant};

use log::{LevelFilter, info};
use sonoscope_engine::{
    AudioSimulator, ConnectionSession, DEFAULT_CAPACITY, SharedHistory, WireFormat, spectrum,
    waterfall, waveform,
};
use sonoscope_messages::{Endpoint, Event, SpectrumScale};

const ANALYSIS_INTERVAL: Duration = Duration::from_millis(50);
const SUMMARY_INTERVAL: Duration = Duration::from_secs(1);
const WAVEFORM_POINTS: usize = 1000;

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("simulate") => simulate(&args[1..]),
        _ => monitor(&args),
    }
}

/// `sonoscope simulate [addr] [--csv]` — serve generated frames for clients.
fn simulate(args: &[String]) -> anyhow::Result<()> {
    let mut format = WireFormat::Json;
    let mut addr = None;
    for arg in args {
        if arg == "--csv" {
            format = WireFormat::Csv;
        } else {
            addr = Some(arg.clone());
        }
    }
    let addr = addr.unwrap_or_else(|| "127.0.0.1:8080".to_string());

    AudioSimulator::bind(&addr, format)?.run()
}

/// `sonoscope [host] [port] [--db]` — headless monitor: connect, receive,
/// and log a once-per-second analysis summary until the stream ends.
fn monitor(args: &[String]) -> anyhow::Result<()> {
    let mut scale = SpectrumScale::Linear;
    let mut positional = Vec::new();
    for arg in args {
        if arg == "--db" {
            scale = SpectrumScale::Db;
        } else {
            positional.push(arg.clone());
        }
    }

    let default = Endpoint::default();
    let host = positional.first().cloned().unwrap_or(default.host);
    let port = match positional.get(1) {
        Some(raw) => raw
            .parse()
            .map_err(|_| anyhow::anyhow!("port must be an integer, got {raw:?}"))?,
        None => default.port,
    };

    let (event_tx, event_rx) = flume::unbounded::<Event>();
    let history = SharedHistory::new(DEFAULT_CAPACITY);
    let mut session = ConnectionSession::new(history.clone(), event_tx);

    // Log every transition the way the GUI collaborator would display it.
    thread::spawn(move || {
        for event in event_rx.iter() {
            if let Event::State { state, message } = event {
                info!("[{}] {message}", if state.is_connected() { "up" } else { "down" });
            }
        }
    });

    if !session.connect(&host, port) {
        anyhow::bail!("could not connect to {host}:{port} ({})", session.state());
    }
    session.start_receiving();

    let mut last_summary = Instant::now();
    while session.state().is_connected() {
        thread::sleep(ANALYSIS_INTERVAL);

        let snapshot = history.snapshot();
        let wave = waveform(&snapshot, WAVEFORM_POINTS);
        let spec = spectrum(&snapshot, scale);
        let fall = waterfall(&snapshot);

        if last_summary.elapsed() >= SUMMARY_INTERVAL {
            last_summary = Instant::now();
            let peak_hz = spec
                .x
                .iter()
                .zip(&spec.y)
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
                .map(|(freq, _)| *freq)
                .unwrap_or(0.0);
            info!(
                "samples: {} | range: [{:.0}, {:.0}] mean: {:.1} | peak: {:.0} Hz | intensity windows: {}",
                wave.stats.count, wave.stats.min, wave.stats.max, wave.stats.mean, peak_hz,
                fall.len(),
            );
        }
    }

    session.disconnect();
    Ok(())
}
