//! High-level error types

use escvp_core::SessionState;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] escvp_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] escvp_transport::Error),

    #[error("Projector {model} not found and no known address to fall back on")]
    NotFound { model: String },

    #[error("Connection closed by projector while {state}")]
    ConnectionClosed { state: SessionState },

    #[error("Timed out while {state}")]
    Timeout { state: SessionState },

    #[error("Command queue for {model} is closed")]
    DispatcherClosed { model: String },

    #[error("Command was dropped before it completed")]
    Cancelled,
}

impl Error {
    /// Check if error is recoverable (retry might succeed)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::ConnectionClosed { .. }
                | Self::Timeout { .. }
                | Self::Transport(_)
        )
    }
}
