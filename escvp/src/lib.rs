//! # escvp
//!
//! Rust client for the ESC/VP.net projector control protocol.
//!
//! ## Features
//!
//! - UDP broadcast discovery with retry and last-known-address fallback
//! - One TCP session per command, with the CONNECT handshake
//! - Per-projector command queue: commands never overlap and run in order
//! - Async/await API using Tokio
//!
//! ## Quick Start
//!
//! ```no_run
//! use escvp::Projector;
//!
//! #[tokio::main]
//! async fn main() -> escvp::Result<()> {
//!     let projector = Projector::new("EB-1780W");
//!
//!     // Fire and forget
//!     projector.power_on()?;
//!
//!     // Wait for the reply
//!     let reply = projector.command("SOURCE?").await?;
//!     println!("Source: {:?}", reply.value("SOURCE"));
//!
//!     Ok(())
//! }
//! ```

pub mod discovery;
pub mod dispatcher;
pub mod error;
pub mod projector;
pub mod session;

// Re-exports
pub use discovery::{Discovery, DiscoveryConfig, FixedAddress, Resolve};
pub use dispatcher::{CommandRunner, Completion, DispatchState, Dispatcher};
pub use error::{Error, Result};
pub use projector::{Projector, ProjectorBuilder};
pub use session::CommandSession;

// Re-export types
pub use escvp_core::{Frame, FrameType, KnownAddressCache, SessionState, Status};
pub use escvp_types::{KnownAddress, Reply};
