//! Transport layer for the ESC/VP.net protocol
//!
//! Provides TCP command connections and the UDP socket pair used for
//! discovery broadcasts.

pub mod tcp;
pub mod udp;
pub mod error;

pub use error::{Error, Result};
pub use tcp::TcpTransport;
pub use udp::BroadcastTransport;

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;

/// Transport trait for connection-oriented communication
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect to device
    async fn connect(&mut self) -> Result<()>;

    /// Disconnect from device
    async fn disconnect(&mut self) -> Result<()>;

    /// Check if connected
    fn is_connected(&self) -> bool;

    /// Send raw bytes
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive whatever bytes the next read returns
    async fn receive(&mut self, timeout: Duration) -> Result<BytesMut>;

    /// Get remote address
    fn remote_addr(&self) -> String;
}
