mod client;
mod close;
mod ice;
mod signaling;
mod status;

pub use client::ClientId;
pub use close::CloseReason;
pub use ice::IceServerConfig;
pub use signaling::{NegotiationRequest, NegotiationResponse, SdpType, SessionDescription};
pub use status::{FrameError, StatusFrame};
