use std::fmt;

/// Connection state of an engine session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::New => "new",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Failed => "failed",
            ConnectionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
    Video,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Audio => f.write_str("audio"),
            TrackKind::Video => f.write_str("video"),
        }
    }
}

/// Lifecycle notifications an engine session pushes to its supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    ConnectionState(ConnectionState),

    /// Diagnostic only.
    IceConnectionState(String),

    /// Diagnostic only.
    IceGatheringState(String),

    /// Remote side started sending a track.
    TrackReceived { track_id: String, kind: TrackKind },

    /// A remote track stopped; the whole session is torn down.
    TrackEnded { track_id: String, kind: TrackKind },
}

/// Statistics snapshot taken when a session fails.
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    pub entries: usize,
    pub report: String,
}
