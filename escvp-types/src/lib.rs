//! Type definitions for escvp

pub mod known_address;
pub mod reply;

pub use known_address::KnownAddress;
pub use reply::Reply;
