use crate::{AppError, AppResult};

use std::panic::Location;

use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use error_location::ErrorLocation;

/// Modifier of the platform paste chord: Cmd on macOS, Ctrl elsewhere.
#[cfg(target_os = "macos")]
const PASTE_MODIFIER: Key = Key::Meta;
#[cfg(not(target_os = "macos"))]
const PASTE_MODIFIER: Key = Key::Control;

/// Holds the paste modifier down for as long as the guard lives.
///
/// Dropping the guard releases the modifier, so a failure between press and
/// release can never leave it stuck. Release is best-effort; the OS resets
/// modifier state on the next physical key event anyway.
pub struct PasteKeyGuard {
    enigo: Enigo,
}

impl PasteKeyGuard {
    /// Press the paste modifier.
    #[track_caller]
    pub(crate) fn press() -> AppResult<Self> {
        let mut enigo =
            Enigo::new(&Settings::default()).map_err(|e| AppError::Paste {
                reason: format!("Failed to create Enigo: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        enigo
            .key(PASTE_MODIFIER, Direction::Press)
            .map_err(|e| AppError::Paste {
                reason: format!("Failed to press paste modifier: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(Self { enigo })
    }

    /// Click `key` while the modifier is held.
    #[track_caller]
    pub(crate) fn click(&mut self, key: Key) -> AppResult<()> {
        self.enigo
            .key(key, Direction::Click)
            .map_err(|e| AppError::Paste {
                reason: format!("Failed to click {:?}: {}", key, e),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}

impl Drop for PasteKeyGuard {
    fn drop(&mut self) {
        let _ = self.enigo.key(PASTE_MODIFIER, Direction::Release);
    }
}
