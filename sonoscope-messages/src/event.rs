use crate::{ConnectionState, SampleBatch};

/// Events published by the session for the display layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Connection state transition, with a human-readable description.
    State {
        state: ConnectionState,
        message: String,
    },
    /// One decoded batch of samples, in decode order.
    Samples(SampleBatch),
}
