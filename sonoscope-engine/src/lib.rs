mod analysis;
mod framing;
mod history;
mod session;
mod sim;

pub use analysis::{
    MIN_SPECTRUM_SAMPLES, RMS_WINDOW, SAMPLE_RATE, SPECTRUM_WINDOW, spectrum, waterfall, waveform,
};
pub use framing::{FrameDecoder, MAX_PENDING_BYTES};
pub use history::{DEFAULT_CAPACITY, MAX_CAPACITY, MIN_CAPACITY, SampleHistory, SharedHistory};
pub use session::{CONNECT_TIMEOUT, ConnectionSession};
pub use sim::{AudioSimulator, WireFormat};
