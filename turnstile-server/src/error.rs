use std::time::Duration;
use thiserror::Error;
use turnstile_core::{CloseReason, SdpType};

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Queue already holds `max_connections` clients.
    #[error("admission queue is full ({capacity} clients)")]
    CapacityExceeded { capacity: usize },

    /// Text frame that does not decode as a negotiation request.
    #[error("malformed negotiation frame: {0}")]
    MalformedFrame(#[from] serde_json::Error),

    #[error("expected an offer, got {0}")]
    UnexpectedSdpType(SdpType),

    #[error("binary frames are not part of the signaling protocol")]
    BinaryFrame,

    #[error("signaling channel error: {0}")]
    Channel(String),

    /// Outbound half of the channel is gone.
    #[error("signaling channel closed")]
    ChannelClosed,

    #[error("offer not received within {0:?}")]
    OfferTimeout(Duration),

    #[error("media engine error: {0:#}")]
    Engine(#[from] anyhow::Error),

    #[error("engine session has no local description")]
    MissingLocalDescription,
}

impl GatewayError {
    /// Close reason to report to the client. `None` when the channel is
    /// already gone.
    pub fn close_reason(&self) -> Option<CloseReason> {
        match self {
            GatewayError::CapacityExceeded { .. } => Some(CloseReason::CapacityExceeded),
            GatewayError::MalformedFrame(_)
            | GatewayError::UnexpectedSdpType(_)
            | GatewayError::BinaryFrame => Some(CloseReason::MalformedFrame),
            GatewayError::OfferTimeout(_) => Some(CloseReason::OfferTimeout),
            GatewayError::Engine(_) | GatewayError::MissingLocalDescription => {
                Some(CloseReason::NegotiationFailed)
            }
            GatewayError::Channel(_) | GatewayError::ChannelClosed => None,
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
