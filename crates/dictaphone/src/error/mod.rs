use dictaphone_core::CoreError;

use std::{panic::Location, path::PathBuf, result::Result as StdResult};

use error_location::ErrorLocation;
use thiserror::Error;

/// Errors raised by the tray application around the session core.
///
/// Every variant records where it was created.
#[derive(Error, Debug)]
pub enum AppError {
    /// Session, transport, history or audio failure from dictaphone-core.
    #[error("{source} (surfaced {location})")]
    Core {
        /// The underlying core error.
        #[source]
        source: CoreError,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// The platform refused global hotkeys altogether.
    #[error("Global hotkeys unavailable: {reason} {location}")]
    HotkeysUnavailable {
        /// Reason reported by the platform.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// One chord could not be parsed or bound.
    #[error("Cannot bind hotkey '{hotkey}': {reason} {location}")]
    HotkeyRejected {
        /// The chord as written in the config.
        hotkey: String,
        /// Why it was rejected.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Clipboard could not be opened or written.
    #[error("Clipboard error: {reason} {location}")]
    Clipboard {
        /// Reason reported by the clipboard backend.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Simulating the paste chord failed; the text is still on the clipboard.
    #[error("Paste simulation failed: {reason} {location}")]
    Paste {
        /// Reason reported by the input backend.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// The config file could not be read, parsed, written or opened.
    #[error("Config file {path:?}: {reason} {location}")]
    ConfigFile {
        /// File the operation targeted.
        path: PathBuf,
        /// What went wrong.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Config values that parse but cannot be used together.
    #[error("Invalid configuration: {reason} {location}")]
    InvalidConfig {
        /// What is wrong with the values.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// No home directory, so no config, data or log location.
    #[error("Cannot determine the user's config and data directories {location}")]
    NoUserDirectories {
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Tray icon or menu operation failed.
    #[error("Tray error: {reason} {location}")]
    Tray {
        /// Reason reported by the tray backend.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Filesystem error outside the config file itself.
    #[error("IO error: {source} {location}")]
    Io {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
        /// Location where this error was created.
        location: ErrorLocation,
    },
}

// thiserror's #[from] cannot fill the location field.
impl From<CoreError> for AppError {
    #[track_caller]
    fn from(source: CoreError) -> Self {
        AppError::Core {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<std::io::Error> for AppError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        AppError::Io {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Result alias for [`AppError`].
pub type Result<T> = StdResult<T, AppError>;
