/// Lifecycle of one device connection.
///
/// Transitions are published as [`Event::State`](crate::Event) by the
/// session; `Error` is the disconnected-with-detail state a failed attempt
/// or a broken stream lands in. Sessions are restartable from any state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// Connection lost or never established; carries the failure detail.
    Error(String),
}

impl ConnectionState {
    /// True only while a live stream is attached.
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Error(detail) => write!(f, "error: {detail}"),
        }
    }
}

/// Address of the streaming device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Default for Endpoint {
    fn default() -> Self {
        // The firmware configures itself with this static address.
        Endpoint {
            host: "192.168.0.194".to_string(),
            port: 8080,
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
