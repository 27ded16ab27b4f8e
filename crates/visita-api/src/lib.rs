// visita-api: Async Rust client for the Visita marketplace scheduling API

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use client::SchedulingClient;
pub use error::Error;
pub use transport::TransportConfig;
