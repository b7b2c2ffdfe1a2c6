use crate::{CoreError, CoreResult};

use std::panic::Location;

use cpal::traits::{DeviceTrait, HostTrait};
use error_location::ErrorLocation;
use serde::Serialize;

/// An audio input device as offered to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioDeviceInfo {
    /// Stable identifier, the value stored as the selected device.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Whether this is the host's default input.
    pub is_default: bool,
}

/// List input devices on the default host.
#[track_caller]
pub fn list_input_devices() -> CoreResult<Vec<AudioDeviceInfo>> {
    let host = cpal::default_host();

    let default_id = host
        .default_input_device()
        .and_then(|d| d.id().ok())
        .map(|id| id.to_string());

    let devices = host.input_devices().map_err(|e| CoreError::DeviceError {
        reason: format!("Failed to enumerate devices: {}", e),
        location: ErrorLocation::from(Location::caller()),
    })?;

    Ok(devices
        .filter_map(|device| {
            let id = device.id().ok()?.to_string();
            let name = device.description().ok()?.name().to_string();
            let is_default = default_id.as_deref() == Some(id.as_str());
            Some(AudioDeviceInfo {
                id,
                name,
                is_default,
            })
        })
        .collect())
}
