mod media_engine;
mod session_event;
mod transform;
mod webrtc_engine;

pub use media_engine::*;
pub use session_event::*;
pub use transform::*;
pub use webrtc_engine::*;
