//! Error types for neurobeat-synth.

use thiserror::Error;

/// Result type alias for neurobeat-synth operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration parameter.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The audio thread has not drained enough commands.
    #[error("Voice command queue full")]
    QueueFull,

    /// The renderer was dropped (audio output stopped).
    #[error("Renderer disconnected")]
    Disconnected,
}
