mod admission_queue;
mod client_connection;

pub use admission_queue::*;
pub use client_connection::*;
