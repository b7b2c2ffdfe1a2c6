use crate::{
    AppError, AppResult,
    config::{default_hold_hotkey, default_toggle_hotkey},
};

use std::panic::Location;

use dictaphone_core::HotkeyConfig;
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};

/// Global hotkey bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotkeysConfig {
    /// Press once to start, press again to stop.
    #[serde(default = "default_toggle_hotkey")]
    pub toggle: HotkeyConfig,
    /// Hold to record, release to stop.
    #[serde(default = "default_hold_hotkey")]
    pub hold: HotkeyConfig,
}

impl Default for HotkeysConfig {
    fn default() -> Self {
        Self {
            toggle: default_toggle_hotkey(),
            hold: default_hold_hotkey(),
        }
    }
}

impl HotkeysConfig {
    /// Both chords must be valid and distinct.
    #[track_caller]
    pub fn validate(&self) -> AppResult<()> {
        self.toggle.validate()?;
        self.hold.validate()?;

        if self.toggle == self.hold {
            return Err(AppError::InvalidConfig {
                reason: format!(
                    "Toggle and hold hotkeys are both bound to {}",
                    self.toggle
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(())
    }
}
