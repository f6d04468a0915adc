use crate::transport::{
    ConnectionState, MediaEngine, PeerSession, SessionEvent, SessionStats, TrackKind,
    TransformRegistry,
};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use turnstile_core::{IceServerConfig, SdpType, SessionDescription};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_VP8, MediaEngine as CodecRegistry};
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_gatherer_state::RTCIceGathererState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_local::track_local_static_rtp::TrackLocalStaticRTP;
use webrtc::track::track_local::{TrackLocal, TrackLocalWriter};
use webrtc::track::track_remote::TrackRemote;

/// [`MediaEngine`] backed by the `webrtc` crate.
#[derive(Clone)]
pub struct WebRtcEngine {
    transforms: TransformRegistry,
    gathering_timeout: Duration,
}

impl WebRtcEngine {
    pub fn new(transforms: TransformRegistry, gathering_timeout: Duration) -> Self {
        Self {
            transforms,
            gathering_timeout,
        }
    }
}

#[async_trait]
impl MediaEngine for WebRtcEngine {
    async fn create_session(
        &self,
        ice_servers: &[IceServerConfig],
        events: mpsc::Sender<SessionEvent>,
    ) -> Result<Arc<dyn PeerSession>> {
        let session = WebRtcSession::new(
            ice_servers,
            events,
            self.transforms.clone(),
            self.gathering_timeout,
        )
        .await?;
        Ok(Arc::new(session))
    }
}

pub struct WebRtcSession {
    peer_connection: Arc<RTCPeerConnection>,
    /// Inbound tracks by id, waiting to be relayed.
    remote_tracks: Arc<DashMap<String, Arc<TrackRemote>>>,
    /// Outbound slot the relayed video is written into.
    outbound_video: Mutex<Option<Arc<TrackLocalStaticRTP>>>,
    transforms: TransformRegistry,
    events: mpsc::Sender<SessionEvent>,
    gathering_timeout: Duration,
}

impl WebRtcSession {
    pub async fn new(
        ice_servers: &[IceServerConfig],
        events: mpsc::Sender<SessionEvent>,
        transforms: TransformRegistry,
        gathering_timeout: Duration,
    ) -> Result<Self> {
        let mut codecs = CodecRegistry::default();
        codecs.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut codecs)?;

        let api = APIBuilder::new()
            .with_media_engine(codecs)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("Failed to create peer connection")?,
        );
        let remote_tracks = Arc::new(DashMap::new());

        let state_tx = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                Box::pin(async move {
                    let _ = tx
                        .send(SessionEvent::ConnectionState(connection_state(s)))
                        .await;
                })
            },
        ));

        let ice_tx = events.clone();
        peer_connection.on_ice_connection_state_change(Box::new(
            move |s: RTCIceConnectionState| {
                let tx = ice_tx.clone();
                Box::pin(async move {
                    let _ = tx.send(SessionEvent::IceConnectionState(s.to_string())).await;
                })
            },
        ));

        let gather_tx = events.clone();
        peer_connection.on_ice_gathering_state_change(Box::new(
            move |s: RTCIceGathererState| {
                let tx = gather_tx.clone();
                Box::pin(async move {
                    let _ = tx.send(SessionEvent::IceGatheringState(s.to_string())).await;
                })
            },
        ));

        let track_tx = events.clone();
        let tracks = Arc::clone(&remote_tracks);
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                let tracks = Arc::clone(&tracks);

                Box::pin(async move {
                    let track_id = track.id();
                    let kind = track_kind(track.kind());
                    info!("Track {} received ({})", kind, track_id);

                    match kind {
                        TrackKind::Video => {
                            tracks.insert(track_id.clone(), track);
                        }
                        // Audio is not relayed; drain it so its end is still noticed.
                        TrackKind::Audio => {
                            tokio::spawn(drain_track(track, tx.clone()));
                        }
                    }

                    let _ = tx.send(SessionEvent::TrackReceived { track_id, kind }).await;
                })
            },
        ));

        Ok(Self {
            peer_connection,
            remote_tracks,
            outbound_video: Mutex::new(None),
            transforms,
            events,
            gathering_timeout,
        })
    }

    /// Reserve an outbound video track when the offer carries video, so the
    /// answer already advertises it.
    async fn prepare_outbound_video(&self) -> Result<()> {
        let offers_video = self
            .peer_connection
            .get_transceivers()
            .await
            .iter()
            .any(|t| t.kind() == RTPCodecType::Video);
        if !offers_video || self.outbound_video.lock().is_some() {
            return Ok(());
        }

        let track = Arc::new(TrackLocalStaticRTP::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                ..Default::default()
            },
            "video".to_owned(),
            "turnstile".to_owned(),
        ));

        let rtp_sender = self
            .peer_connection
            .add_track(Arc::clone(&track) as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .context("Failed to add outbound video track")?;

        // RTCP has to be read for the interceptors to work.
        tokio::spawn(async move {
            let mut rtcp_buf = vec![0u8; 1500];
            while rtp_sender.read(&mut rtcp_buf).await.is_ok() {}
        });

        *self.outbound_video.lock() = Some(track);
        Ok(())
    }
}

#[async_trait]
impl PeerSession for WebRtcSession {
    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        let desc = to_rtc(description)?;
        self.peer_connection
            .set_remote_description(desc)
            .await
            .context("Failed to set remote description")?;
        self.prepare_outbound_video().await
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .context("Failed to create answer")?;
        from_rtc(&answer).ok_or_else(|| anyhow!("Engine produced an untyped answer"))
    }

    /// Waits for ICE gathering so the local description carries candidates.
    async fn set_local_description(&self, description: SessionDescription) -> Result<()> {
        let desc = to_rtc(description)?;
        let mut gathering_complete = self.peer_connection.gathering_complete_promise().await;

        self.peer_connection
            .set_local_description(desc)
            .await
            .context("Failed to set local description")?;

        if tokio::time::timeout(self.gathering_timeout, gathering_complete.recv())
            .await
            .is_err()
        {
            warn!(
                "ICE gathering not complete after {:?}, answering with partial candidates",
                self.gathering_timeout
            );
        }
        Ok(())
    }

    async fn local_description(&self) -> Option<SessionDescription> {
        let desc = self.peer_connection.local_description().await?;
        from_rtc(&desc)
    }

    async fn relay_track(&self, track_id: &str, transform: &str) -> Result<()> {
        let Some((_, remote)) = self.remote_tracks.remove(track_id) else {
            bail!("No inbound track {track_id}");
        };
        let Some(outbound) = self.outbound_video.lock().clone() else {
            // Keep reading so the track's end still closes the session.
            tokio::spawn(drain_track(remote, self.events.clone()));
            bail!("Session has no outbound video track");
        };
        let transform = self.transforms.resolve(transform);
        let events = self.events.clone();
        let track_id = track_id.to_owned();

        debug!("Relaying {} through {:?}", track_id, transform.name());
        tokio::spawn(async move {
            loop {
                let mut packet = match remote.read_rtp().await {
                    Ok((packet, _)) => packet,
                    Err(e) => {
                        debug!("Inbound track {} stopped: {}", track_id, e);
                        break;
                    }
                };
                packet.payload = transform.apply(packet.payload);

                if let Err(e) = outbound.write_rtp(&packet).await {
                    debug!("Dropping relayed packet: {}", e);
                }
            }

            let _ = events
                .send(SessionEvent::TrackEnded {
                    track_id,
                    kind: TrackKind::Video,
                })
                .await;
        });
        Ok(())
    }

    async fn stats(&self) -> Result<SessionStats> {
        let report = self.peer_connection.get_stats().await;
        Ok(SessionStats {
            entries: report.reports.len(),
            report: format!("{:#?}", report.reports),
        })
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

async fn drain_track(track: Arc<TrackRemote>, events: mpsc::Sender<SessionEvent>) {
    let track_id = track.id();
    let kind = track_kind(track.kind());

    while track.read_rtp().await.is_ok() {}

    let _ = events
        .send(SessionEvent::TrackEnded { track_id, kind })
        .await;
}

fn connection_state(state: RTCPeerConnectionState) -> ConnectionState {
    match state {
        RTCPeerConnectionState::Unspecified | RTCPeerConnectionState::New => ConnectionState::New,
        RTCPeerConnectionState::Connecting => ConnectionState::Connecting,
        RTCPeerConnectionState::Connected => ConnectionState::Connected,
        RTCPeerConnectionState::Disconnected => ConnectionState::Disconnected,
        RTCPeerConnectionState::Failed => ConnectionState::Failed,
        RTCPeerConnectionState::Closed => ConnectionState::Closed,
    }
}

fn track_kind(kind: RTPCodecType) -> TrackKind {
    match kind {
        RTPCodecType::Video => TrackKind::Video,
        _ => TrackKind::Audio,
    }
}

fn to_rtc(description: SessionDescription) -> Result<RTCSessionDescription> {
    let desc = match description.sdp_type {
        SdpType::Offer => RTCSessionDescription::offer(description.sdp)?,
        SdpType::Answer => RTCSessionDescription::answer(description.sdp)?,
        SdpType::Pranswer => RTCSessionDescription::pranswer(description.sdp)?,
        SdpType::Rollback => bail!("Rollback descriptions are not supported"),
    };
    Ok(desc)
}

fn from_rtc(description: &RTCSessionDescription) -> Option<SessionDescription> {
    let sdp_type = match description.sdp_type {
        RTCSdpType::Offer => SdpType::Offer,
        RTCSdpType::Answer => SdpType::Answer,
        RTCSdpType::Pranswer => SdpType::Pranswer,
        RTCSdpType::Rollback => SdpType::Rollback,
        RTCSdpType::Unspecified => return None,
    };
    Some(SessionDescription {
        sdp: description.sdp.clone(),
        sdp_type,
    })
}
