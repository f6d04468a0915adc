use crate::transport::{SessionEvent, SessionStats};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use turnstile_core::{IceServerConfig, SessionDescription};

/// Factory for peer sessions. The gateway never touches media itself.
#[async_trait]
pub trait MediaEngine: Send + Sync + 'static {
    /// Create a fresh session. Lifecycle notifications go to `events`.
    async fn create_session(
        &self,
        ice_servers: &[IceServerConfig],
        events: mpsc::Sender<SessionEvent>,
    ) -> Result<Arc<dyn PeerSession>>;
}

/// One peer connection inside the engine.
#[async_trait]
pub trait PeerSession: Send + Sync + 'static {
    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, description: SessionDescription) -> Result<()>;

    async fn local_description(&self) -> Option<SessionDescription>;

    /// Subscribe to an inbound track, run it through the named transform and
    /// publish the result back on this session.
    async fn relay_track(&self, track_id: &str, transform: &str) -> Result<()>;

    async fn stats(&self) -> Result<SessionStats>;

    async fn close(&self) -> Result<()>;
}
