mod signal_link;
mod ws_handler;

pub use signal_link::*;
pub use ws_handler::*;
