use crate::config::{GatewayConfig, LocalDescriptionPolicy};
use crate::error::{GatewayError, GatewayResult};
use crate::gate::GateLease;
use crate::gateway::SessionSupervisor;
use crate::transport::{MediaEngine, PeerSession};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};
use turnstile_core::{
    ClientId, IceServerConfig, NegotiationRequest, NegotiationResponse, SdpType,
    SessionDescription,
};

const SESSION_EVENT_BUFFER: usize = 64;

/// Runs the single offer/answer exchange of the head-of-queue client.
pub struct SessionNegotiator {
    engine: Arc<dyn MediaEngine>,
    ice_servers: Vec<IceServerConfig>,
    policy: LocalDescriptionPolicy,
    connect_timeout: Duration,
}

impl SessionNegotiator {
    pub fn new(engine: Arc<dyn MediaEngine>, config: &GatewayConfig) -> Self {
        Self {
            engine,
            ice_servers: config.ice_servers.clone(),
            policy: config.local_description_policy,
            connect_timeout: config.connect_timeout,
        }
    }

    /// Exchanges `request` for an answer, giving up as soon as `departed`
    /// resolves. `Ok(None)` means the client left before the answer existed.
    ///
    /// On success the lease moves into the returned [`NegotiatedSession`],
    /// which keeps the gate held until it is supervised and the engine
    /// session ends, or until it is abandoned. On failure or departure the
    /// session is closed and the lease is dropped here.
    pub async fn negotiate<F>(
        &self,
        lease: GateLease,
        client: ClientId,
        request: NegotiationRequest,
        departed: F,
    ) -> GatewayResult<Option<NegotiatedSession>>
    where
        F: Future<Output = ()>,
    {
        let NegotiationRequest {
            description,
            video_transform,
        } = request;
        if description.sdp_type != SdpType::Offer {
            return Err(GatewayError::UnexpectedSdpType(description.sdp_type));
        }

        info!(client = %client, %video_transform, "Creating peer session");
        let (events_tx, events_rx) = mpsc::channel(SESSION_EVENT_BUFFER);
        let session = self
            .engine
            .create_session(&self.ice_servers, events_tx)
            .await?;

        let exchanged = tokio::select! {
            result = self.exchange(session.as_ref(), description) => Some(result),
            _ = departed => None,
        };

        match exchanged {
            Some(Ok(local)) => Ok(Some(NegotiatedSession {
                response: NegotiationResponse::from(local),
                supervisor: SessionSupervisor::new(
                    client,
                    session,
                    events_rx,
                    lease,
                    video_transform,
                    self.connect_timeout,
                ),
            })),
            Some(Err(e)) => {
                close_quietly(client, session.as_ref()).await;
                drop(lease);
                Err(e)
            }
            None => {
                info!(client = %client, "Client left during negotiation");
                close_quietly(client, session.as_ref()).await;
                drop(lease);
                Ok(None)
            }
        }
    }

    async fn exchange(
        &self,
        session: &dyn PeerSession,
        offer: SessionDescription,
    ) -> GatewayResult<SessionDescription> {
        session.set_remote_description(offer).await?;

        let answer = session.create_answer().await?;
        if let Err(e) = session.set_local_description(answer).await {
            match self.policy {
                LocalDescriptionPolicy::Strict => return Err(e.into()),
                LocalDescriptionPolicy::Lenient => {
                    warn!("Local description rejected, answering anyway: {:#}", e);
                }
            }
        }

        session
            .local_description()
            .await
            .ok_or(GatewayError::MissingLocalDescription)
    }
}

/// An answered session whose supervisor has not started yet.
pub struct NegotiatedSession {
    response: NegotiationResponse,
    supervisor: SessionSupervisor,
}

impl NegotiatedSession {
    /// Starts supervision and hands back the answer for the client.
    pub fn supervise(self) -> NegotiationResponse {
        self.supervisor.spawn();
        self.response
    }

    /// Closes the session without answering and frees the gate.
    pub async fn abandon(self) {
        self.supervisor.abandon().await;
    }
}

async fn close_quietly(client: ClientId, session: &dyn PeerSession) {
    if let Err(e) = session.close().await {
        warn!(client = %client, "Failed to close peer session: {:#}", e);
    }
}
