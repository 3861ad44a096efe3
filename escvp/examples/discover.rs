//! Discovery example: find a projector and print its address

use escvp::{Discovery, DiscoveryConfig, KnownAddressCache};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> escvp::Result<()> {
    // Initialize logging (RUST_LOG=escvp=trace shows wire bytes)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let model = std::env::var("ESCVP_MODEL").unwrap_or_else(|_| "projector".to_string());

    println!("Looking for {}...", model);

    let discovery = Discovery::new(model, DiscoveryConfig::default(), KnownAddressCache::shared());
    let address = discovery.discover().await?;

    println!("✓ Found at {}", address);

    Ok(())
}
