use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::gate::{GateLease, SessionGate};
use crate::gateway::SessionNegotiator;
use crate::queue::{Admission, AdmissionQueue, ClientConnection};
use crate::signaling::{InboundSignal, OutboundSignal, SignalLink};
use crate::transport::MediaEngine;
use std::sync::Arc;
use tracing::{debug, info, warn};
use turnstile_core::{CloseReason, NegotiationRequest, StatusFrame};

/// How a client's turn at the gateway ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientExit {
    /// Queue was full on arrival.
    Rejected,
    /// Client closed the channel.
    Disconnected,
    /// Answer delivered.
    Negotiated,
    /// Dropped on a protocol, timeout or engine error.
    Failed,
}

struct GatewayInner {
    config: GatewayConfig,
    queue: AdmissionQueue,
    gate: SessionGate,
    negotiator: SessionNegotiator,
}

/// Admission queue, session gate and negotiator wired together.
///
/// Cheap to clone; every clone drives the same queue and gate.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

impl Gateway {
    pub fn new(config: GatewayConfig, engine: Arc<dyn MediaEngine>) -> Self {
        let negotiator = SessionNegotiator::new(engine, &config);

        Self {
            inner: Arc::new(GatewayInner {
                queue: AdmissionQueue::new(config.max_connections),
                gate: SessionGate::new(),
                negotiator,
                config,
            }),
        }
    }

    pub fn queue(&self) -> &AdmissionQueue {
        &self.inner.queue
    }

    pub fn gate(&self) -> &SessionGate {
        &self.inner.gate
    }

    /// Admits the client and runs its loop until it leaves, is served, or
    /// fails. The client is out of the queue when this returns.
    pub async fn accept(&self, mut link: SignalLink) -> ClientExit {
        let connection = ClientConnection::new(link.id, link.address.clone());

        if let Err(e) = self.inner.queue.try_admit(connection) {
            warn!(client = %link.id, address = %link.address, "Rejecting client: {}", e);
            link.close(CloseReason::CapacityExceeded);
            return ClientExit::Rejected;
        }
        info!(
            client = %link.id,
            address = %link.address,
            queued = self.inner.queue.len(),
            capacity = self.inner.queue.capacity(),
            "Client admitted"
        );

        let result = self.run_client(&mut link).await;
        if let Some(connection) = self.inner.queue.remove(&link.id) {
            debug!(
                client = %link.id,
                queued_for = ?connection.admitted_at.elapsed(),
                "Client removed from queue"
            );
        }

        match result {
            Ok(exit) => {
                info!(client = %link.id, ?exit, "Client left the queue");
                exit
            }
            Err(e) => {
                warn!(client = %link.id, "Client dropped: {}", e);
                if let Some(reason) = e.close_reason() {
                    link.close(reason);
                }
                ClientExit::Failed
            }
        }
    }

    async fn run_client(&self, link: &mut SignalLink) -> GatewayResult<ClientExit> {
        loop {
            match self.inner.queue.evaluate(&link.id, &self.inner.gate) {
                Admission::Departed => return Ok(ClientExit::Disconnected),

                Admission::Eligible(lease) => {
                    info!(client = %link.id, "Client may negotiate");
                    link.send_status(StatusFrame::Eligible)?;

                    let Some(request) = self.await_offer(link).await? else {
                        return Ok(ClientExit::Disconnected);
                    };
                    return self.negotiate(link, lease, request).await;
                }

                Admission::Waiting(position) => {
                    debug!(client = %link.id, position, "Client waiting");
                    link.send_status(StatusFrame::Waiting(position))?;

                    // One status frame per tick, however much the client sends.
                    let tick = tokio::time::sleep(self.inner.config.poll_interval);
                    tokio::pin!(tick);
                    loop {
                        tokio::select! {
                            _ = &mut tick => break,
                            signal = link.recv() => match signal {
                                InboundSignal::Closed => return Ok(ClientExit::Disconnected),
                                InboundSignal::Error(e) => return Err(GatewayError::Channel(e)),
                                InboundSignal::Text(_) | InboundSignal::Binary => {
                                    debug!(client = %link.id, "Ignoring frame from waiting client");
                                }
                            },
                        }
                    }
                }
            }
        }
    }

    /// Waits for the one negotiation frame. `None` if the client left.
    async fn await_offer(&self, link: &mut SignalLink) -> GatewayResult<Option<NegotiationRequest>> {
        let timeout = self.inner.config.offer_timeout;
        let signal = tokio::time::timeout(timeout, link.recv())
            .await
            .map_err(|_| GatewayError::OfferTimeout(timeout))?;

        match signal {
            InboundSignal::Text(text) => Ok(Some(NegotiationRequest::from_json(&text)?)),
            InboundSignal::Binary => Err(GatewayError::BinaryFrame),
            InboundSignal::Closed => Ok(None),
            InboundSignal::Error(e) => Err(GatewayError::Channel(e)),
        }
    }

    async fn negotiate(
        &self,
        link: &mut SignalLink,
        lease: GateLease,
        request: NegotiationRequest,
    ) -> GatewayResult<ClientExit> {
        let client = link.id;
        info!(client = %client, address = %link.address, "Creating peer");
        let negotiated = self
            .inner
            .negotiator
            .negotiate(lease, client, request, link.departed())
            .await?;

        let Some(negotiated) = negotiated else {
            return Ok(ClientExit::Disconnected);
        };
        if link.has_departed() {
            info!(client = %client, "Client left before the answer was sent");
            negotiated.abandon().await;
            return Ok(ClientExit::Disconnected);
        }

        link.send(OutboundSignal::Answer(negotiated.supervise()))?;
        link.close(CloseReason::Negotiated);
        Ok(ClientExit::Negotiated)
    }
}
