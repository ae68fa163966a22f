// unigate-api: Async Rust client for the official UniFi Integration APIs
// (Network + Protect), local console or cloud connector.

pub mod auth;
pub mod client;
pub mod connection;
pub mod error;
pub mod network;
pub mod protect;
pub mod response;
pub mod transport;
pub mod websocket;

pub use auth::Credential;
pub use client::ApiClient;
pub use connection::{ConnectionContext, ConnectionMode};
pub use error::Error;
pub use network::NetworkClient;
pub use protect::{EventFilter, ProtectClient};
pub use response::Payload;
pub use transport::TransportConfig;
pub use websocket::{ChannelState, ReconnectPolicy, SubscriptionChannel, SubscriptionKind};
