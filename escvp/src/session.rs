//! Command sessions
//!
//! A command session resolves the projector's address, opens a fresh TCP
//! connection, performs the CONNECT handshake, sends one command and
//! collects its reply. The connection is shut down whatever the outcome.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use escvp_core::constants::{DEFAULT_PORT, DEFAULT_READ_TIMEOUT, DEFAULT_TIMEOUT};
use escvp_core::{Session, Step};
use escvp_transport::{TcpTransport, Transport};
use escvp_types::Reply;

use crate::discovery::Resolve;
use crate::dispatcher::CommandRunner;
use crate::error::{Error, Result};

/// Runs single commands against a resolved projector
#[derive(Clone)]
pub struct CommandSession {
    resolver: Arc<dyn Resolve>,
    port: u16,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl CommandSession {
    pub fn new(resolver: Arc<dyn Resolve>) -> Self {
        Self {
            resolver,
            port: DEFAULT_PORT,
            connect_timeout: Duration::from_secs(DEFAULT_TIMEOUT),
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT),
        }
    }

    /// Set the TCP port commands are sent to
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the timeout applied to every read
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Execute `command` over a new connection
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The address cannot be resolved
    /// - The connection cannot be opened
    /// - The projector closes the connection or stops answering before the
    ///   reply is complete
    pub async fn run(&self, command: &str) -> Result<Reply> {
        let mut session = Session::new(command)?;

        let address = self.resolver.resolve().await?;

        let mut transport = TcpTransport::from_socket_addr(SocketAddr::new(address, self.port))
            .with_connect_timeout(self.connect_timeout);
        transport.connect().await?;

        let result = self.exchange(&mut transport, &mut session).await;

        if let Err(e) = transport.disconnect().await {
            debug!("Shutdown of {} failed: {}", transport.remote_addr(), e);
        }

        result
    }

    async fn exchange(&self, transport: &mut TcpTransport, session: &mut Session) -> Result<Reply> {
        transport.send(&session.handshake()).await?;

        loop {
            let state = session.state();
            let data = match transport.receive(self.read_timeout).await {
                Ok(data) => data,
                Err(escvp_transport::Error::ConnectionClosed) => {
                    warn!(command = session.command(), "Connection closed while {}", state);
                    return Err(Error::ConnectionClosed { state });
                }
                Err(escvp_transport::Error::ReadTimeout) => {
                    warn!(command = session.command(), "Timed out while {}", state);
                    return Err(Error::Timeout { state });
                }
                Err(e) => return Err(e.into()),
            };

            match session.feed(&data)? {
                Step::Send(line) => transport.send(&line).await?,
                Step::Wait => {}
                Step::Reply(reply) => return Ok(reply),
            }
        }
    }
}

#[async_trait]
impl CommandRunner for CommandSession {
    async fn run(&self, command: &str) -> Result<Reply> {
        CommandSession::run(self, command).await
    }
}
