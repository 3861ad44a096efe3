//! Error types for escvp-core

/// Result type alias for escvp-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The count byte cannot describe more sub-headers
    #[error("Too many sub-headers: a frame carries at most {max}")]
    TooManySubHeaders {
        max: usize,
    },

    /// Command text that cannot be framed as a single line
    #[error("Invalid command {command:?}: {reason}")]
    InvalidCommand {
        command: String,
        reason: &'static str,
    },

    /// Invalid session state
    #[error("Invalid session state: {0}")]
    InvalidSessionState(String),
}
