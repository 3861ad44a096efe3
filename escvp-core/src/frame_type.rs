//! ESC/VP.net frame type and status codes

use std::fmt;

/// Frame type byte (offset 11)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FrameType {
    /// Discovery
    Hello,
    /// Command session handshake
    Connect,
    /// Any code this client does not speak
    Unknown(u8),
}

impl FrameType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Hello => "HELLO",
            Self::Connect => "CONNECT",
            Self::Unknown(_) => "UNKNOWN",
        }
    }
}

impl From<FrameType> for u8 {
    fn from(frame_type: FrameType) -> u8 {
        match frame_type {
            FrameType::Hello => 0x01,
            FrameType::Connect => 0x03,
            FrameType::Unknown(code) => code,
        }
    }
}

impl From<u8> for FrameType {
    fn from(value: u8) -> Self {
        match value {
            0x01 => Self::Hello,
            0x03 => Self::Connect,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), u8::from(*self))
    }
}

/// Status byte (offset 14)
///
/// Requests always carry [`Status::Request`]. Projectors answer with
/// [`Status::Ok`] or one of the refusal codes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    Request,
    Ok,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotAllowed,
    ServiceUnavailable,
    VersionNotSupported,
    Unknown(u8),
}

impl Status {
    /// Check if this is a success response
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Request => "REQUEST",
            Self::Ok => "OK",
            Self::BadRequest => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotAllowed => "REQUEST_NOT_ALLOWED",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::VersionNotSupported => "VERSION_NOT_SUPPORTED",
            Self::Unknown(_) => "UNKNOWN",
        }
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> u8 {
        match status {
            Status::Request => 0x00,
            Status::Ok => 0x20,
            Status::BadRequest => 0x40,
            Status::Unauthorized => 0x41,
            Status::Forbidden => 0x43,
            Status::NotAllowed => 0x45,
            Status::ServiceUnavailable => 0x53,
            Status::VersionNotSupported => 0x55,
            Status::Unknown(code) => code,
        }
    }
}

impl From<u8> for Status {
    fn from(value: u8) -> Self {
        match value {
            0x00 => Self::Request,
            0x20 => Self::Ok,
            0x40 => Self::BadRequest,
            0x41 => Self::Unauthorized,
            0x43 => Self::Forbidden,
            0x45 => Self::NotAllowed,
            0x53 => Self::ServiceUnavailable,
            0x55 => Self::VersionNotSupported,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), u8::from(*self))
    }
}
