use std::time::Instant;
use turnstile_core::ClientId;

/// A signaling peer waiting in (or at the head of) the admission queue.
#[derive(Debug, Clone)]
pub struct ClientConnection {
    pub id: ClientId,
    /// `X-Forwarded-For` when the proxy supplied it, else the socket address.
    pub address: String,
    pub admitted_at: Instant,
}

impl ClientConnection {
    pub fn new(id: ClientId, address: impl Into<String>) -> Self {
        Self {
            id,
            address: address.into(),
            admitted_at: Instant::now(),
        }
    }
}
