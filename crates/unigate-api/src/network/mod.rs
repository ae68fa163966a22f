//! Device-management (Network) product client.

mod client;
pub mod types;

pub use client::NetworkClient;
