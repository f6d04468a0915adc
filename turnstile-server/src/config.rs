use std::net::SocketAddr;
use std::time::Duration;
use turnstile_core::IceServerConfig;

pub const DEFAULT_STUN_URL: &str = "stun:stun.l.google.com:19302";

/// What to do when the engine rejects its own answer as local description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalDescriptionPolicy {
    /// Fail the negotiation and free the gate.
    #[default]
    Strict,
    /// Log the error and answer with whatever local description exists.
    Lenient,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub listen_addr: SocketAddr,
    pub max_connections: usize,
    /// Delay between two status frames sent to a waiting client.
    pub poll_interval: Duration,
    /// How long the head of the queue may stay eligible without offering.
    pub offer_timeout: Duration,
    /// How long a negotiated session may take to reach `connected`.
    pub connect_timeout: Duration,
    pub ice_gathering_timeout: Duration,
    pub ice_servers: Vec<IceServerConfig>,
    pub local_description_policy: LocalDescriptionPolicy,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8764)),
            max_connections: 3,
            poll_interval: Duration::from_secs(1),
            offer_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(60),
            ice_gathering_timeout: Duration::from_secs(5),
            ice_servers: vec![IceServerConfig::stun(DEFAULT_STUN_URL)],
            local_description_policy: LocalDescriptionPolicy::default(),
        }
    }
}
