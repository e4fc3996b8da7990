// bigip-api: Async Rust client for the BIG-IP iControl REST API.

pub mod catalog;
pub mod client;
pub mod error;
pub mod stats;
pub mod transport;
pub mod types;

pub use catalog::Module;
pub use client::{BigIpClient, RetryPolicy};
pub use error::Error;
pub use stats::StatsRecord;
pub use transport::{TlsMode, TransportConfig};
