//! UDP transport for discovery
//!
//! Discovery uses two sockets: a listener bound to the well-known port,
//! where projectors answer broadcasts, and a broadcast-enabled sender on an
//! ephemeral port. Replies addressed to the sender's source port are
//! accepted as well.

use std::io;
use std::net::SocketAddr;

use bytes::BytesMut;
use tokio::net::UdpSocket;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, trace, warn};

use crate::error::*;

const DATAGRAM_SIZE: usize = 2048;

/// Listener/sender socket pair for one discovery run
///
/// Both sockets are released by [`close`](BroadcastTransport::close), which
/// is idempotent and also runs on drop.
pub struct BroadcastTransport {
    listener: Option<UdpSocket>,
    sender: Option<UdpSocket>,
}

impl BroadcastTransport {
    /// Bind the listener on `listen_port` and an ephemeral broadcast sender
    ///
    /// If the listener port is already taken, for instance by another
    /// discovery in the same process, the transport continues with the
    /// sender socket alone.
    pub async fn bind(listen_port: u16) -> Result<Self> {
        let listener = match UdpSocket::bind(("0.0.0.0", listen_port)).await {
            Ok(socket) => Some(socket),
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                warn!(
                    "UDP port {} is in use, listening for replies on the sender socket only",
                    listen_port
                );
                None
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let sender = UdpSocket::bind("0.0.0.0:0").await?;
        sender.set_broadcast(true)?;

        debug!(
            listener = ?listener.as_ref().and_then(|s| s.local_addr().ok()),
            sender = ?sender.local_addr().ok(),
            "Discovery sockets bound"
        );

        Ok(Self {
            listener,
            sender: Some(sender),
        })
    }

    /// Check if the sockets are still open
    pub fn is_open(&self) -> bool {
        self.sender.is_some()
    }

    /// Send one datagram to `target`
    pub async fn send_to(&self, data: &[u8], target: SocketAddr) -> Result<()> {
        let sender = self.sender.as_ref().ok_or(Error::SocketClosed)?;

        trace!("Sending {} bytes to {}: {}", data.len(), target, hex::encode(data));

        sender.send_to(data, target).await?;
        Ok(())
    }

    /// Wait for the next datagram on either socket
    ///
    /// Returns `Ok(None)` once `deadline` passes without one.
    pub async fn recv_until(&self, deadline: Instant) -> Result<Option<(BytesMut, SocketAddr)>> {
        let sender = self.sender.as_ref().ok_or(Error::SocketClosed)?;

        let mut sender_buf = [0u8; DATAGRAM_SIZE];
        let mut listener_buf = [0u8; DATAGRAM_SIZE];

        let received = timeout_at(deadline, async {
            match &self.listener {
                Some(listener) => tokio::select! {
                    r = listener.recv_from(&mut listener_buf) => r.map(|(n, from)| (true, n, from)),
                    r = sender.recv_from(&mut sender_buf) => r.map(|(n, from)| (false, n, from)),
                },
                None => sender
                    .recv_from(&mut sender_buf)
                    .await
                    .map(|(n, from)| (false, n, from)),
            }
        })
        .await;

        let (on_listener, n, from) = match received {
            Err(_) => return Ok(None),
            Ok(result) => result?,
        };
        let data = if on_listener {
            &listener_buf[..n]
        } else {
            &sender_buf[..n]
        };

        trace!("Received {} bytes from {}: {}", n, from, hex::encode(data));
        Ok(Some((BytesMut::from(data), from)))
    }

    /// Release both sockets
    pub fn close(&mut self) {
        let listener = self.listener.take();
        let sender = self.sender.take();
        if listener.is_some() || sender.is_some() {
            debug!("Discovery sockets closed");
        }
    }
}

impl Drop for BroadcastTransport {
    fn drop(&mut self) {
        self.close();
    }
}
