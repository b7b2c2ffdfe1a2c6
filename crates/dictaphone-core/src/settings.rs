use crate::{CoreError, CoreResult};

use std::panic::Location;

use error_location::ErrorLocation;

/// The part of the user's settings a session reads when it starts.
///
/// Published through a `watch` channel and read once per session at connect
/// time, so edits apply to the next session and never to the live one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSettings {
    /// Transcription backend URL.
    pub endpoint_url: Option<String>,
    /// Input device id; `None` selects the system default.
    pub selected_device: Option<String>,
}

impl SessionSettings {
    /// The configured endpoint, if it is set and non-blank.
    #[track_caller]
    pub fn endpoint(&self) -> CoreResult<&str> {
        match self.endpoint_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(url),
            _ => Err(CoreError::EndpointUnknown {
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}
