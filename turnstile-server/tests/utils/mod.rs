pub mod ws_client;

pub use mock_engine::*;
pub use test_client::*;
pub use test_peer::*;
pub use ws_client::*;
