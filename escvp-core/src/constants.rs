//! Protocol constants

use std::net::{IpAddr, Ipv4Addr};

/// Protocol identifier at the start of every frame
pub const PROTOCOL_ID: &[u8; 10] = b"ESC/VP.net";

/// Protocol version byte
pub const PROTOCOL_VERSION: u8 = 0x10;

/// Default UDP/TCP port
pub const DEFAULT_PORT: u16 = 3629;

/// Default discovery broadcast target
pub const BROADCAST_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::BROADCAST);

/// Default connection timeout (seconds)
pub const DEFAULT_TIMEOUT: u64 = 5;

/// Default read timeout (seconds)
pub const DEFAULT_READ_TIMEOUT: u64 = 5;

/// Wait per discovery attempt (milliseconds)
pub const DISCOVERY_INTERVAL_MS: u64 = 1000;

/// HELLO re-sends after the first one before discovery gives up
pub const DISCOVERY_RETRIES: u32 = 30;

/// Command line terminator
pub const COMMAND_TERMINATOR: u8 = b'\r';

/// Prompt that ends every ESC/VP21 reply
pub const REPLY_PROMPT: u8 = b':';

/// Fixed command text
pub mod commands {
    pub const POWER_ON: &str = "PWR ON";
    pub const POWER_OFF: &str = "PWR OFF";
}
