//! Last confirmed network location of a projector

use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, Utc};

/// Address a projector answered discovery from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownAddress {
    /// Source address of the HELLO reply
    pub address: IpAddr,

    /// When the address was last confirmed by a live reply
    pub confirmed_at: DateTime<Utc>,
}

impl KnownAddress {
    /// Record `address` as confirmed now
    pub fn confirmed(address: IpAddr) -> Self {
        Self {
            address,
            confirmed_at: Utc::now(),
        }
    }
}

impl fmt::Display for KnownAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (confirmed {})",
            self.address,
            self.confirmed_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}
