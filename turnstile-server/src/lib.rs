mod config;
mod error;
mod gate;
mod gateway;
mod queue;
mod server;
mod signaling;
mod transport;

pub use config::*;
pub use error::*;
pub use gate::*;
pub use gateway::*;
pub use queue::*;
pub use server::*;
pub use signaling::*;
pub use transport::*;
