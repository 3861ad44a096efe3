//! High-level projector interface

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, info};

use escvp_core::constants::{commands, DEFAULT_PORT, DEFAULT_READ_TIMEOUT, DEFAULT_TIMEOUT};
use escvp_core::KnownAddressCache;
use escvp_types::Reply;

use crate::discovery::{Discovery, DiscoveryConfig, FixedAddress, Resolve};
use crate::dispatcher::{DispatchState, Dispatcher};
use crate::error::{Error, Result};
use crate::session::CommandSession;

/// ESC/VP.net projector
///
/// Commands are queued and executed one at a time, each over its own TCP
/// connection. The projector is located by broadcast discovery before every
/// command unless a fixed address is configured.
///
/// # Examples
///
/// ```no_run
/// use escvp::Projector;
///
/// #[tokio::main]
/// async fn main() -> escvp::Result<()> {
///     let projector = Projector::new("EB-1780W");
///
///     let reply = projector.command("PWR?").await?;
///     println!("Power: {:?}", reply.value("PWR"));
///
///     projector.power_on()?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Projector {
    model: String,
    dispatcher: Dispatcher,
}

impl Projector {
    /// Create a projector located by discovery, using the process-wide
    /// address cache
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(model: impl Into<String>) -> Self {
        Self::builder(model).build()
    }

    pub fn builder(model: impl Into<String>) -> ProjectorBuilder {
        ProjectorBuilder::new(model)
    }

    /// Model label this projector was created with
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Queue an arbitrary command
    ///
    /// `on_result` receives the reply lines, or the error that ended the
    /// command. It runs on the dispatcher task and should not block.
    pub fn send_command(
        &self,
        command: impl Into<String>,
        on_result: impl FnOnce(Result<Reply>) + Send + 'static,
    ) -> Result<()> {
        self.dispatcher.enqueue(command, on_result)
    }

    /// Queue a command and wait for its reply
    pub async fn command(&self, command: impl Into<String>) -> Result<Reply> {
        let (tx, rx) = oneshot::channel();
        self.dispatcher.enqueue(command, move |result| {
            // The caller may have stopped waiting
            let _ = tx.send(result);
        })?;
        rx.await.map_err(|_| Error::Cancelled)?
    }

    /// Turn the projector on
    pub fn power_on(&self) -> Result<()> {
        info!("Powering on {}...", self.model);
        self.send_command(commands::POWER_ON, |_| {})
    }

    /// Turn the projector off
    pub fn power_off(&self) -> Result<()> {
        info!("Powering off {}...", self.model);
        self.send_command(commands::POWER_OFF, |_| {})
    }

    pub fn state(&self) -> DispatchState {
        self.dispatcher.state()
    }

    /// Commands waiting behind the one in flight
    pub fn pending(&self) -> usize {
        self.dispatcher.pending()
    }
}

/// Builder for [`Projector`]
#[derive(Debug, Clone)]
pub struct ProjectorBuilder {
    model: String,
    port: u16,
    discovery: DiscoveryConfig,
    address: Option<IpAddr>,
    cache: Option<KnownAddressCache>,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl ProjectorBuilder {
    fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            port: DEFAULT_PORT,
            discovery: DiscoveryConfig::default(),
            address: None,
            cache: None,
            connect_timeout: Duration::from_secs(DEFAULT_TIMEOUT),
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT),
        }
    }

    /// Use `port` for both discovery broadcasts and command connections
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self.discovery.port = port;
        self
    }

    /// Replace the discovery settings
    pub fn with_discovery(mut self, config: DiscoveryConfig) -> Self {
        self.discovery = config;
        self
    }

    /// Skip discovery and always connect to `address`
    pub fn with_address(mut self, address: IpAddr) -> Self {
        self.address = Some(address);
        self
    }

    /// Use `cache` instead of the process-wide cache
    pub fn with_cache(mut self, cache: KnownAddressCache) -> Self {
        self.cache = Some(cache);
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

    /// Start the projector's command queue
    ///
    /// Must be called inside a Tokio runtime.
    pub fn build(self) -> Projector {
        let resolver: Arc<dyn Resolve> = match self.address {
            Some(address) => {
                debug!("{} uses fixed address {}", self.model, address);
                Arc::new(FixedAddress(address))
            }
            None => Arc::new(Discovery::new(
                self.model.clone(),
                self.discovery,
                self.cache.unwrap_or_else(KnownAddressCache::shared),
            )),
        };

        let session = CommandSession::new(resolver)
            .with_port(self.port)
            .with_connect_timeout(self.connect_timeout)
            .with_read_timeout(self.read_timeout);

        Projector {
            dispatcher: Dispatcher::spawn(self.model.clone(), session),
            model: self.model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn test_projector_create() {
        let projector = Projector::new("EB-1780W");
        assert_eq!(projector.model(), "EB-1780W");
        assert_eq!(projector.state(), DispatchState::Idle);
        assert_eq!(projector.pending(), 0);
    }

    #[test]
    fn test_builder_port_applies_to_discovery() {
        let builder = Projector::builder("EB-1780W").with_port(4000);
        assert_eq!(builder.port, 4000);
        assert_eq!(builder.discovery.port, 4000);
    }

    #[tokio::test]
    async fn test_invalid_command_reported_to_caller() {
        let projector = Projector::builder("EB-1780W")
            .with_address(IpAddr::V4(Ipv4Addr::LOCALHOST))
            .build();

        let result = projector.command("").await;
        assert!(matches!(
            result,
            Err(Error::Core(escvp_core::Error::InvalidCommand { .. }))
        ));
    }

    #[tokio::test]
    #[ignore] // Only run with a real projector on the network
    async fn test_projector_power_query() {
        let projector = Projector::new("EB-1780W");
        let reply = projector.command("PWR?").await.unwrap();
        println!("{:?}", reply);
    }
}
