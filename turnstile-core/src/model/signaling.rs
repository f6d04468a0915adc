use serde::{Deserialize, Serialize};
use std::fmt;

/// Transform applied when the client does not name one.
pub const DEFAULT_VIDEO_TRANSFORM: &str = "none";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Pranswer,
    Answer,
    Rollback,
}

impl fmt::Display for SdpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SdpType::Offer => "offer",
            SdpType::Pranswer => "pranswer",
            SdpType::Answer => "answer",
            SdpType::Rollback => "rollback",
        };
        f.write_str(s)
    }
}

/// An SDP body with its type tag, as carried on the signaling channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionDescription {
    pub sdp: String,
    #[serde(rename = "type")]
    pub sdp_type: SdpType,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            sdp: sdp.into(),
            sdp_type: SdpType::Offer,
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            sdp: sdp.into(),
            sdp_type: SdpType::Answer,
        }
    }
}

/// Frame sent by the eligible client: its offer plus the transform to run
/// on the video it publishes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NegotiationRequest {
    #[serde(flatten)]
    pub description: SessionDescription,
    #[serde(default = "default_video_transform")]
    pub video_transform: String,
}

fn default_video_transform() -> String {
    DEFAULT_VIDEO_TRANSFORM.to_owned()
}

impl NegotiationRequest {
    pub fn new(description: SessionDescription, video_transform: impl Into<String>) -> Self {
        Self {
            description,
            video_transform: video_transform.into(),
        }
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// Frame sent back once the engine produced its local description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct NegotiationResponse(pub SessionDescription);

impl NegotiationResponse {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn description(&self) -> &SessionDescription {
        &self.0
    }
}

impl From<SessionDescription> for NegotiationResponse {
    fn from(description: SessionDescription) -> Self {
        Self(description)
    }
}
