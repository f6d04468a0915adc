use crate::gate::GateLease;
use crate::transport::{ConnectionState, PeerSession, SessionEvent, TrackKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use turnstile_core::ClientId;

/// Why a supervised session stopped holding the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Closed,
    Failed,
    TrackEnded,
    ConnectTimeout,
    /// Engine dropped its event channel without a terminal state.
    EngineGone,
}

/// Owns a negotiated session and the gate lease for as long as the media
/// session lives. Dropping the supervisor releases the gate.
pub struct SessionSupervisor {
    client: ClientId,
    session: Arc<dyn PeerSession>,
    events: mpsc::Receiver<SessionEvent>,
    lease: GateLease,
    video_transform: String,
    connect_timeout: Duration,
}

impl SessionSupervisor {
    pub fn new(
        client: ClientId,
        session: Arc<dyn PeerSession>,
        events: mpsc::Receiver<SessionEvent>,
        lease: GateLease,
        video_transform: String,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            client,
            session,
            events,
            lease,
            video_transform,
            connect_timeout,
        }
    }

    pub fn spawn(self) -> JoinHandle<SessionEnd> {
        tokio::spawn(self.run())
    }

    /// Closes the session without supervising it and releases the gate.
    pub async fn abandon(self) {
        info!(client = %self.client, "Abandoning peer session");
        self.close_session().await;
    }

    pub async fn run(mut self) -> SessionEnd {
        let deadline = Instant::now() + self.connect_timeout;
        let mut connected = false;

        let end = loop {
            tokio::select! {
                event = self.events.recv() => {
                    let Some(event) = event else {
                        warn!(client = %self.client, "Engine dropped session events");
                        self.close_session().await;
                        break SessionEnd::EngineGone;
                    };
                    if let Some(end) = self.handle_event(event, &mut connected).await {
                        break end;
                    }
                }

                _ = tokio::time::sleep_until(deadline), if !connected => {
                    warn!(
                        client = %self.client,
                        "Session not connected after {:?}, closing",
                        self.connect_timeout
                    );
                    self.close_session().await;
                    break SessionEnd::ConnectTimeout;
                }
            }
        };

        info!(client = %self.client, ?end, "Peer session over, releasing gate");
        drop(self.lease);
        end
    }

    async fn handle_event(
        &mut self,
        event: SessionEvent,
        connected: &mut bool,
    ) -> Option<SessionEnd> {
        match event {
            SessionEvent::ConnectionState(state) => {
                info!(client = %self.client, %state, "Connection state changed");
                match state {
                    ConnectionState::Connected => *connected = true,
                    ConnectionState::Failed => {
                        self.dump_stats().await;
                        self.close_session().await;
                        return Some(SessionEnd::Failed);
                    }
                    ConnectionState::Closed => return Some(SessionEnd::Closed),
                    _ => {}
                }
            }

            SessionEvent::IceConnectionState(state) => {
                debug!(client = %self.client, %state, "ICE connection state changed");
            }

            SessionEvent::IceGatheringState(state) => {
                debug!(client = %self.client, %state, "ICE gathering state changed");
            }

            SessionEvent::TrackReceived { track_id, kind } => {
                info!(client = %self.client, %kind, "Track received");
                if kind == TrackKind::Video {
                    if let Err(e) = self
                        .session
                        .relay_track(&track_id, &self.video_transform)
                        .await
                    {
                        // The engine still reports the track's end, so the
                        // session closes when it stops.
                        error!(client = %self.client, "Failed to relay {}: {:#}", track_id, e);
                    }
                }
            }

            SessionEvent::TrackEnded { kind, .. } => {
                info!(client = %self.client, "Track {} ended, closing connection", kind);
                self.close_session().await;
                return Some(SessionEnd::TrackEnded);
            }
        }

        None
    }

    async fn dump_stats(&self) {
        match self.session.stats().await {
            Ok(stats) => {
                info!("{:-^70}", " Connection Stats ");
                info!(client = %self.client, entries = stats.entries, "{}", stats.report);
                info!("{}", "-".repeat(70));
            }
            Err(e) => warn!(client = %self.client, "Failed to collect stats: {:#}", e),
        }
    }

    async fn close_session(&self) {
        if let Err(e) = self.session.close().await {
            warn!(client = %self.client, "Failed to close peer session: {:#}", e);
        }
    }
}
