mod event;
mod series;
mod state;
mod units;

pub use event::Event;
pub use series::{SampleBatch, Series, SpectrumScale, SummaryStats};
pub use state::{ConnectionState, Endpoint};
pub use units::{Decibels, Hertz};
