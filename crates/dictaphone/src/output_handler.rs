//! Delivers transcripts to the focused application.
//!
//! Text always lands on the clipboard; with auto-paste enabled the platform
//! paste chord is simulated afterwards.

use crate::{AppError, AppResult, PasteKeyGuard};

use std::{
    panic::Location,
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use arboard::Clipboard;
use async_trait::async_trait;
use dictaphone_core::{CoreError, CoreResult, TextInjector};
use enigo::Key;
use error_location::ErrorLocation;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Delay between clipboard write and paste simulation.
///
/// Clipboard managers need a moment to pick up the write; pasting sooner can
/// insert stale content.
const CLIPBOARD_SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Gap between key events in the paste simulation.
const KEY_EVENT_DELAY: Duration = Duration::from_millis(10);

/// Clipboard and auto-paste output.
pub struct OutputHandler {
    pub(crate) clipboard: Mutex<Clipboard>,
    auto_paste: AtomicBool,
}

impl OutputHandler {
    /// Create a new output handler.
    #[track_caller]
    #[instrument]
    pub fn new(auto_paste: bool) -> AppResult<Self> {
        let clipboard = Clipboard::new().map_err(|e| AppError::Clipboard {
            reason: format!("Failed to initialize clipboard: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(auto_paste, "OutputHandler initialized");

        Ok(Self {
            clipboard: Mutex::new(clipboard),
            auto_paste: AtomicBool::new(auto_paste),
        })
    }

    /// Change whether later transcripts are pasted.
    pub fn set_auto_paste(&self, auto_paste: bool) {
        self.auto_paste.store(auto_paste, Ordering::Relaxed);
    }

    /// Whether transcripts are pasted after copying.
    pub fn auto_paste(&self) -> bool {
        self.auto_paste.load(Ordering::Relaxed)
    }

    /// Copy text to the clipboard and optionally paste it.
    ///
    /// The clipboard write happens first, so a failed paste still leaves the
    /// text available to the user.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn output_text(&self, text: &str, auto_paste: bool) -> AppResult<()> {
        self.clipboard
            .lock()
            .await
            .set_text(text)
            .map_err(|e| AppError::Clipboard {
                reason: format!("Failed to set clipboard: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        debug!("Text copied to clipboard");

        if auto_paste {
            tokio::time::sleep(CLIPBOARD_SETTLE_DELAY).await;

            if let Err(e) = self.paste().await {
                warn!(
                    error = ?e,
                    "Auto-paste failed, but text is in clipboard"
                );
                return Err(e);
            }
        }

        info!(auto_pasted = auto_paste, "Text output complete");

        Ok(())
    }

    #[instrument(skip(self))]
    async fn paste(&self) -> AppResult<()> {
        // Enigo is not Send, so the instance is created inside the blocking
        // task. The guard releases the modifier even if the V click fails.
        let paste_result = tokio::task::spawn_blocking(|| {
            let mut guard = PasteKeyGuard::press()?;

            std::thread::sleep(KEY_EVENT_DELAY);
            guard.click(Key::Unicode('v'))?;
            std::thread::sleep(KEY_EVENT_DELAY);

            Ok::<(), AppError>(())
        })
        .await
        .map_err(|e| AppError::Paste {
            reason: format!("Paste task panicked: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        paste_result?;

        debug!("Auto-paste simulated");

        Ok(())
    }
}

#[async_trait]
impl TextInjector for OutputHandler {
    async fn inject(&self, text: &str) -> CoreResult<()> {
        self.output_text(text, self.auto_paste())
            .await
            .map_err(|e| CoreError::InjectionFailed {
                reason: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}
