use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

/// Session, transport and audio errors with source location tracking.
#[derive(Error, Debug)]
pub enum CoreError {
    /// No transcription endpoint is configured.
    #[error("No transcription endpoint configured {location}")]
    EndpointUnknown {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The backend was unreachable or rejected the connection.
    #[error("Failed to connect to {endpoint}: {reason} {location}")]
    ConnectFailed {
        /// Endpoint the connection was attempted against.
        endpoint: String,
        /// Description of the failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The session controller is no longer running.
    #[error("Session controller stopped {location}")]
    ControllerStopped {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A frame could not be queued on the active connection.
    #[error("Failed to send frame: {reason} {location}")]
    SendFailed {
        /// Description of the failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Releasing the connection failed.
    #[error("Failed to disconnect: {reason} {location}")]
    DisconnectFailed {
        /// Description of the failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Text could not be delivered to the input focus.
    #[error("Text injection failed: {reason} {location}")]
    InjectionFailed {
        /// Description of the failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// History log read or write failed.
    #[error("History error: {reason} {location}")]
    History {
        /// Description of the failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// No audio input device found.
    #[error("No microphone found {location}")]
    NoMicrophoneFound {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Audio device operation failed.
    #[error("Audio device error: {reason} {location}")]
    DeviceError {
        /// Description of the device error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Audio resampling failed.
    #[error("Resampling error: {reason} {location}")]
    ResamplingError {
        /// Description of the resampling error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Hotkey definition is not usable.
    #[error("Invalid hotkey '{hotkey}': {reason} {location}")]
    InvalidHotkey {
        /// The offending hotkey as written.
        hotkey: String,
        /// Why it was rejected.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// IO error from filesystem operations.
    #[error("IO error: {source} {location}")]
    Io {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// JSON encoding or decoding failed.
    #[error("Serialization error: {source} {location}")]
    Serialization {
        /// The underlying serde_json error.
        #[source]
        source: serde_json::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl From<std::io::Error> for CoreError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        CoreError::Io {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    #[track_caller]
    fn from(source: serde_json::Error) -> Self {
        CoreError::Serialization {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;
