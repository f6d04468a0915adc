use crate::error::{GatewayError, GatewayResult};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::debug;
use turnstile_core::{ClientId, CloseReason, NegotiationResponse, StatusFrame};

/// What the transport delivers from a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundSignal {
    Text(String),
    /// Binary frames have no meaning on the signaling channel.
    Binary,
    /// Remote side closed cleanly.
    Closed,
    /// Abnormal close or transport failure.
    Error(String),
}

/// What the gateway asks the transport to deliver to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundSignal {
    Status(StatusFrame),
    Answer(NegotiationResponse),
    /// Send a close frame and stop writing.
    Close(CloseReason),
}

/// The gateway's view of one signaling channel, independent of WebSocket.
pub struct SignalLink {
    pub id: ClientId,
    pub address: String,
    inbound: mpsc::Receiver<InboundSignal>,
    outbound: mpsc::UnboundedSender<OutboundSignal>,
}

impl SignalLink {
    pub fn new(
        id: ClientId,
        address: impl Into<String>,
        inbound: mpsc::Receiver<InboundSignal>,
        outbound: mpsc::UnboundedSender<OutboundSignal>,
    ) -> Self {
        Self {
            id,
            address: address.into(),
            inbound,
            outbound,
        }
    }

    pub fn send(&self, signal: OutboundSignal) -> GatewayResult<()> {
        self.outbound
            .send(signal)
            .map_err(|_| GatewayError::ChannelClosed)
    }

    pub fn send_status(&self, frame: StatusFrame) -> GatewayResult<()> {
        self.send(OutboundSignal::Status(frame))
    }

    /// Best effort: the peer may already be gone.
    pub fn close(&self, reason: CloseReason) {
        let _ = self.outbound.send(OutboundSignal::Close(reason));
    }

    /// Next inbound signal; a dropped transport reads as `Closed`.
    pub async fn recv(&mut self) -> InboundSignal {
        self.inbound.recv().await.unwrap_or(InboundSignal::Closed)
    }

    /// Resolves once the client closes or the transport fails. Frames that
    /// arrive meanwhile are dropped.
    pub async fn departed(&mut self) {
        loop {
            match self.recv().await {
                InboundSignal::Closed | InboundSignal::Error(_) => return,
                InboundSignal::Text(_) | InboundSignal::Binary => {
                    debug!(client = %self.id, "Ignoring frame during negotiation");
                }
            }
        }
    }

    /// Non-blocking check for a close already waiting in the inbound queue.
    pub fn has_departed(&mut self) -> bool {
        loop {
            match self.inbound.try_recv() {
                Ok(InboundSignal::Closed | InboundSignal::Error(_)) => return true,
                Ok(_) => continue,
                Err(TryRecvError::Empty) => return false,
                Err(TryRecvError::Disconnected) => return true,
            }
        }
    }
}
