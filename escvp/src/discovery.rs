//! Projector discovery
//!
//! Broadcasts HELLO frames until a projector answers with HELLO/OK, retrying
//! on a fixed interval. When nobody answers, the last address the projector
//! was confirmed at is used instead.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use escvp_core::constants::{
    BROADCAST_ADDR, DEFAULT_PORT, DISCOVERY_INTERVAL_MS, DISCOVERY_RETRIES,
};
use escvp_core::{Frame, KnownAddressCache};
use escvp_transport::BroadcastTransport;

use crate::error::{Error, Result};

/// Source of the address a command session connects to
#[async_trait]
pub trait Resolve: Send + Sync {
    async fn resolve(&self) -> Result<IpAddr>;
}

/// Statically configured projector address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedAddress(pub IpAddr);

#[async_trait]
impl Resolve for FixedAddress {
    async fn resolve(&self) -> Result<IpAddr> {
        Ok(self.0)
    }
}

/// Discovery settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Port HELLO frames are sent to
    pub port: u16,

    /// Local port replies are expected on
    pub listen_port: u16,

    /// Broadcast target
    pub broadcast: IpAddr,

    /// Wait per attempt
    pub interval: Duration,

    /// Re-sends after the first HELLO
    pub retries: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            listen_port: DEFAULT_PORT,
            broadcast: BROADCAST_ADDR,
            interval: Duration::from_millis(DISCOVERY_INTERVAL_MS),
            retries: DISCOVERY_RETRIES,
        }
    }
}

impl DiscoveryConfig {
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_listen_port(mut self, port: u16) -> Self {
        self.listen_port = port;
        self
    }

    pub fn with_broadcast(mut self, broadcast: IpAddr) -> Self {
        self.broadcast = broadcast;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }
}

/// Discovery for one projector
///
/// # Examples
///
/// ```no_run
/// use escvp::{Discovery, DiscoveryConfig};
/// use escvp::KnownAddressCache;
///
/// #[tokio::main]
/// async fn main() -> escvp::Result<()> {
///     let discovery = Discovery::new("EB-1780W", DiscoveryConfig::default(), KnownAddressCache::shared());
///     let address = discovery.discover().await?;
///     println!("Projector at {}", address);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Discovery {
    model: String,
    config: DiscoveryConfig,
    cache: KnownAddressCache,
}

impl Discovery {
    pub fn new(model: impl Into<String>, config: DiscoveryConfig, cache: KnownAddressCache) -> Self {
        Self {
            model: model.into(),
            config,
            cache,
        }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    pub fn cache(&self) -> &KnownAddressCache {
        &self.cache
    }

    /// Find the projector's current address
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when every attempt times out and the
    /// cache has no address for this model, or a transport error if a
    /// socket fails.
    pub async fn discover(&self) -> Result<IpAddr> {
        let mut transport = BroadcastTransport::bind(self.config.listen_port).await?;

        let result = self.broadcast_until_found(&transport).await;
        transport.close();

        match result {
            Ok(Some(address)) => {
                if self.cache.remember(&self.model, address) {
                    info!("Found {} on {}", self.model, address);
                } else {
                    debug!("Found {} on {}", self.model, address);
                }
                Ok(address)
            }
            Ok(None) => {
                warn!(
                    "{} not found after {} attempts",
                    self.model,
                    self.config.retries + 1
                );
                match self.cache.lookup(&self.model) {
                    Some(known) => {
                        info!("Falling back to last known address of {}: {}", self.model, known);
                        Ok(known.address)
                    }
                    None => Err(Error::NotFound {
                        model: self.model.clone(),
                    }),
                }
            }
            Err(e) => {
                warn!("{} discovery failed: {}", self.model, e);
                Err(e)
            }
        }
    }

    async fn broadcast_until_found(&self, transport: &BroadcastTransport) -> Result<Option<IpAddr>> {
        let hello = Frame::hello().encode();
        let target = SocketAddr::new(self.config.broadcast, self.config.port);
        let mut retries = self.config.retries;

        loop {
            transport.send_to(&hello, target).await?;

            let deadline = Instant::now() + self.config.interval;
            if let Some(address) = self.await_hello_ok(transport, deadline).await? {
                return Ok(Some(address));
            }

            if retries == 0 {
                return Ok(None);
            }
            retries -= 1;
            trace!("No reply from {}, {} retries left", self.model, retries);
        }
    }

    async fn await_hello_ok(
        &self,
        transport: &BroadcastTransport,
        deadline: Instant,
    ) -> Result<Option<IpAddr>> {
        while let Some((datagram, from)) = transport.recv_until(deadline).await? {
            match Frame::decode(&datagram) {
                Some(frame) if frame.is_hello_ok() => return Ok(Some(from.ip())),
                Some(frame) => trace!("Ignoring {} from {}", frame, from),
                None => trace!("Ignoring {} byte datagram from {}", datagram.len(), from),
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl Resolve for Discovery {
    async fn resolve(&self) -> Result<IpAddr> {
        self.discover().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_default_config() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.port, 3629);
        assert_eq!(config.listen_port, 3629);
        assert_eq!(config.broadcast, IpAddr::V4(Ipv4Addr::BROADCAST));
        assert_eq!(config.interval, Duration::from_secs(1));
        assert_eq!(config.retries, 30);
    }

    #[test]
    fn test_config_builder() {
        let config = DiscoveryConfig::default()
            .with_port(4000)
            .with_listen_port(0)
            .with_broadcast(IpAddr::V4(Ipv4Addr::LOCALHOST))
            .with_interval(Duration::from_millis(10))
            .with_retries(2);

        assert_eq!(config.port, 4000);
        assert_eq!(config.listen_port, 0);
        assert_eq!(config.interval, Duration::from_millis(10));
        assert_eq!(config.retries, 2);
    }

    #[tokio::test]
    async fn test_fixed_address() {
        let address = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10));
        assert_eq!(FixedAddress(address).resolve().await.unwrap(), address);
    }
}
