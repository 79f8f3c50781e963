//! Error types for neurobeat-analysis.

use thiserror::Error;

/// Result type alias for neurobeat-analysis operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// No capture device, or capture support not compiled in.
    #[error("Microphone unavailable: {0}")]
    MicrophoneUnavailable(String),

    /// The platform refused microphone access.
    #[error("Microphone permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[cfg(feature = "cpal")]
    #[error("Input device not available")]
    DeviceNotAvailable(#[from] cpal::DefaultStreamConfigError),

    #[cfg(feature = "cpal")]
    #[error("Failed to build input stream")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[cfg(feature = "cpal")]
    #[error("Failed to start input stream")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[cfg(feature = "cpal")]
    #[error("Failed to enumerate input devices")]
    DevicesError(#[from] cpal::DevicesError),

    #[cfg(feature = "cpal")]
    #[error("Failed to get device name")]
    DeviceNameError(#[from] cpal::DeviceNameError),

    #[error("Voice polling thread failed to start: {0}")]
    Spawn(#[from] std::io::Error),
}
