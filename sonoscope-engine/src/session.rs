use std::io::{ErrorKind, Read};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use flume::Sender;
use log::{debug, info};
use sonoscope_messages::{ConnectionState, Event};

use crate::framing::FrameDecoder;
use crate::history::SharedHistory;

/// Default budget for one connection attempt.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Socket read poll interval; bounds how long disconnect can lag.
const READ_TIMEOUT: Duration = Duration::from_millis(500);
const CHUNK_SIZE: usize = 1024;

/// State shared between the session handle and its receive thread.
struct Shared {
    state: Mutex<ConnectionState>,
    stop: AtomicBool,
    event_tx: Sender<Event>,
}

impl Shared {
    /// Publish a state transition. The event is sent while the state lock is
    /// held so listeners observe transitions in write order.
    fn transition(&self, state: ConnectionState, message: String) {
        let mut guard = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = state.clone();
        debug!("session state: {state} ({message})");
        let _ = self.event_tx.send(Event::State { state, message });
    }

    fn fail(&self, detail: String) {
        self.transition(ConnectionState::Error(detail.clone()), detail);
    }

    fn state(&self) -> ConnectionState {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

/// Owns one device connection: socket lifecycle, the receive thread that
/// feeds bytes through [`FrameDecoder`] into the shared history, and the
/// state transitions published to the display layer.
///
/// Transport failures never escape this boundary as errors; every failure
/// path becomes an [`Event::State`] transition. Sessions are restartable:
/// after a disconnect or failure, `connect` may be called again.
pub struct ConnectionSession {
    shared: Arc<Shared>,
    history: SharedHistory,
    socket: Option<TcpStream>,
    receiver: Option<JoinHandle<()>>,
}

impl ConnectionSession {
    pub fn new(history: SharedHistory, event_tx: Sender<Event>) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(ConnectionState::Disconnected),
                stop: AtomicBool::new(false),
                event_tx,
            }),
            history,
            socket: None,
            receiver: None,
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Handle to the sample store this session appends into.
    pub fn history(&self) -> SharedHistory {
        self.history.clone()
    }

    /// Change the history ceiling for display configuration.
    pub fn set_capacity(&self, capacity: usize) {
        self.history.set_capacity(capacity);
    }

    /// Connect with the default timeout. Returns whether the session ended
    /// up `Connected`; the detail travels on the event channel either way.
    pub fn connect(&mut self, host: &str, port: u16) -> bool {
        self.connect_timeout(host, port, CONNECT_TIMEOUT)
    }

    /// Connect with an explicit budget covering resolution and every
    /// candidate address. Any previous connection is torn down first.
    pub fn connect_timeout(&mut self, host: &str, port: u16, timeout: Duration) -> bool {
        self.teardown();
        self.shared.transition(
            ConnectionState::Connecting,
            format!("connecting to {host}:{port}"),
        );

        let deadline = Instant::now() + timeout;
        let addrs = match (host, port).to_socket_addrs() {
            Ok(addrs) => addrs.collect::<Vec<_>>(),
            Err(e) => {
                self.shared.fail(format!("cannot resolve {host}: {e}"));
                return false;
            }
        };
        if addrs.is_empty() {
            self.shared.fail(format!("{host} resolved to no addresses"));
            return false;
        }

        let mut last_error = String::new();
        for addr in addrs {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                last_error = format!("connect to {host}:{port} timed out");
                break;
            }
            match TcpStream::connect_timeout(&addr, remaining) {
                Ok(socket) => {
                    if let Err(e) = socket.set_read_timeout(Some(READ_TIMEOUT)) {
                        self.shared.fail(format!("socket setup failed: {e}"));
                        return false;
                    }
                    self.socket = Some(socket);
                    self.shared.transition(
                        ConnectionState::Connected,
                        format!("connected to {host}:{port}"),
                    );
                    return true;
                }
                Err(e) => last_error = format!("connect to {addr} failed: {e}"),
            }
        }

        self.shared.fail(last_error);
        false
    }

    /// Spawn the receive loop. No-op unless `Connected`, and no-op when a
    /// loop is already running.
    pub fn start_receiving(&mut self) {
        if !self.state().is_connected() || self.receiver.is_some() {
            return;
        }
        let Some(socket) = self.socket.as_ref() else {
            return;
        };
        let socket = match socket.try_clone() {
            Ok(socket) => socket,
            Err(e) => {
                self.shared.fail(format!("socket handle unavailable: {e}"));
                return;
            }
        };

        self.shared.stop.store(false, Ordering::SeqCst);
        let shared = self.shared.clone();
        let history = self.history.clone();
        self.receiver = Some(thread::spawn(move || {
            receive_loop(socket, shared, history);
        }));
        info!("receive loop started");
    }

    /// Tear down the socket and receive thread from any state, then report
    /// the transition. Close-time errors are ignored.
    pub fn disconnect(&mut self) {
        self.teardown();
        self.shared
            .transition(ConnectionState::Disconnected, "disconnected".to_string());
    }

    fn teardown(&mut self) {
        self.shared.stop.store(true, Ordering::SeqCst);
        if let Some(socket) = self.socket.take() {
            let _ = socket.shutdown(Shutdown::Both);
        }
        if let Some(handle) = self.receiver.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ConnectionSession {
    fn drop(&mut self) {
        // No transition: the event channel may already be gone.
        self.teardown();
    }
}

/// Blocking read loop on the dedicated receive thread. Any read error or a
/// peer close is terminal for this connection attempt; decode-level problems
/// are absorbed inside the decoder and never end the loop.
fn receive_loop(mut socket: TcpStream, shared: Arc<Shared>, history: SharedHistory) {
    let mut decoder = FrameDecoder::new();
    let mut chunk = [0u8; CHUNK_SIZE];

    while !shared.stop.load(Ordering::SeqCst) {
        match socket.read(&mut chunk) {
            Ok(0) => {
                // A local shutdown also surfaces as end-of-stream; only a
                // peer-initiated close is an error.
                if shared.stop.load(Ordering::SeqCst) {
                    break;
                }
                shared.fail("connection closed by peer".to_string());
                break;
            }
            Ok(n) => {
                for batch in decoder.feed(&chunk[..n]) {
                    history.append(&batch);
                    let _ = shared.event_tx.send(Event::Samples(batch));
                }
            }
            // Poll tick with nothing to read.
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => {
                // A read failed because disconnect shut the socket down.
                if shared.stop.load(Ordering::SeqCst) {
                    break;
                }
                shared.fail(format!("socket error: {e}"));
                break;
            }
        }
    }
    debug!("receive loop exited");
}
