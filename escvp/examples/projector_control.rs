//! Projector control example
//!
//! Set ESCVP_ADDRESS to skip discovery.

use std::net::IpAddr;
use std::time::Duration;

use escvp::Projector;
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> escvp::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let model = std::env::var("ESCVP_MODEL").unwrap_or_else(|_| "projector".to_string());

    let mut builder = Projector::builder(model);
    if let Some(address) = std::env::var("ESCVP_ADDRESS")
        .ok()
        .and_then(|s| s.parse::<IpAddr>().ok())
    {
        builder = builder.with_address(address);
    }
    let projector = builder.build();

    let reply = projector.command("PWR?").await?;
    println!("Power state: {}", reply.value("PWR").unwrap_or("unknown"));

    println!("Powering on...");
    projector.power_on()?;

    // Queued behind PWR ON
    let reply = projector.command("SOURCE?").await?;
    println!("Source: {}", reply.value("SOURCE").unwrap_or("unknown"));

    sleep(Duration::from_secs(3)).await;

    println!("Powering off...");
    projector.command("PWR OFF").await?;

    println!("Done!");

    Ok(())
}
