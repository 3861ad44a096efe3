//! # escvp-core
//!
//! Core protocol implementation for the ESC/VP.net projector control protocol.
//!
//! This crate provides the low-level protocol primitives:
//! - Frame structure and encoding/decoding
//! - Frame type and status codes
//! - The command exchange state machine
//! - The known-address cache
//! - Protocol constants

pub mod cache;
pub mod constants;
pub mod error;
pub mod frame;
pub mod frame_type;
pub mod session;

pub use cache::KnownAddressCache;
pub use error::{Error, Result};
pub use frame::{Frame, SubHeader};
pub use frame_type::{FrameType, Status};
pub use session::{Session, SessionState, Step};

pub use constants::DEFAULT_PORT;
