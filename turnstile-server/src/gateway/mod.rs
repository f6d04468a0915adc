mod gateway;
mod negotiator;
mod supervisor;

pub use gateway::*;
pub use negotiator::*;
pub use supervisor::*;
