//! Global hotkeys for starting and stopping dictation.
//!
//! Two chords are registered: a toggle (press to start, press again to stop)
//! and a hold (press to start, release to stop). Both reduce to
//! [`SessionCommand`]s for the session controller.

use crate::{AppError, AppResult, config::HotkeysConfig};

use std::{panic::Location, time::Duration};

use dictaphone_core::{HotkeyConfig, SessionCommand, SessionHandle};
use error_location::ErrorLocation;
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState, hotkey::HotKey};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};

/// Ids of the registered chords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisteredHotkeys {
    /// Id of the toggle chord.
    pub toggle_id: u32,
    /// Id of the hold chord.
    pub hold_id: u32,
}

impl RegisteredHotkeys {
    /// Translate a hotkey event into a session command.
    ///
    /// A toggle press is sent as [`SessionCommand::Toggle`] and resolved by
    /// the controller against its own state, so quick double taps never race
    /// a snapshot.
    pub fn command_for(&self, id: u32, state: HotKeyState) -> Option<SessionCommand> {
        if id == self.toggle_id {
            return match state {
                HotKeyState::Pressed => Some(SessionCommand::Toggle),
                HotKeyState::Released => None,
            };
        }

        if id == self.hold_id {
            return match state {
                HotKeyState::Pressed => Some(SessionCommand::StartRequested),
                HotKeyState::Released => Some(SessionCommand::StopRequested),
            };
        }

        None
    }
}

/// Convert a configured chord into a `global_hotkey` hotkey.
#[track_caller]
pub fn to_global_hotkey(config: &HotkeyConfig) -> AppResult<HotKey> {
    config.validate()?;

    let mut parts: Vec<&str> = Vec::with_capacity(config.modifiers.len() + 1);
    for name in dictaphone_core::MODIFIER_NAMES {
        if config.modifiers.iter().any(|m| m.eq_ignore_ascii_case(name)) {
            parts.push(match name {
                "meta" => "super",
                other => other,
            });
        }
    }
    parts.push(config.key.trim());

    let accelerator = parts.join("+");

    accelerator
        .parse::<HotKey>()
        .map_err(|e| AppError::HotkeyRejected {
            hotkey: config.to_string(),
            reason: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
}

/// Forwards global hotkey events to the session controller.
pub struct HotkeyHandler {
    hotkeys: RegisteredHotkeys,
    session: SessionHandle,
}

impl HotkeyHandler {
    /// Register the toggle and hold chords.
    ///
    /// Must be called on a thread with a message pump (e.g. the main thread
    /// running a `tao` event loop) so that `WM_HOTKEY` messages are
    /// dispatched on Windows. The returned [`GlobalHotKeyManager`] must be
    /// kept alive on that thread for the hotkeys to remain registered.
    #[track_caller]
    #[instrument]
    pub fn register_hotkeys(
        config: &HotkeysConfig,
    ) -> AppResult<(GlobalHotKeyManager, RegisteredHotkeys)> {
        config.validate()?;

        let manager =
            GlobalHotKeyManager::new().map_err(|e| AppError::HotkeysUnavailable {
                reason: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let toggle = to_global_hotkey(&config.toggle)?;
        let hold = to_global_hotkey(&config.hold)?;
        let registered = RegisteredHotkeys {
            toggle_id: toggle.id(),
            hold_id: hold.id(),
        };

        for (name, hotkey, chord) in [
            ("toggle", toggle, &config.toggle),
            ("hold", hold, &config.hold),
        ] {
            manager
                .register(hotkey)
                .map_err(|e| AppError::HotkeyRejected {
                    hotkey: chord.to_string(),
                    reason: format!("{} binding refused: {}", name, e),
                    location: ErrorLocation::from(Location::caller()),
                })?;

            info!(hotkey = %chord, role = name, "Global hotkey registered");
        }

        Ok((manager, registered))
    }

    /// Create a handler for previously registered hotkeys.
    ///
    /// This struct is `Send` and can live on any thread; it only listens on
    /// the global [`GlobalHotKeyEvent`] channel.
    pub fn new(hotkeys: RegisteredHotkeys, session: SessionHandle) -> Self {
        Self { hotkeys, session }
    }

    /// Run the hotkey event loop until a shutdown signal is received.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) -> AppResult<()> {
        let receiver = GlobalHotKeyEvent::receiver().clone();
        let (event_tx, mut event_rx) = mpsc::channel(32);

        // GlobalHotKeyEvent::receiver() is a blocking crossbeam receiver; one
        // blocking task forwards it. It exits on the first send after
        // event_rx is dropped.
        let handle = tokio::task::spawn_blocking(move || {
            while let Ok(event) = receiver.recv() {
                if event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("Hotkey handler shutting down");
                    break;
                }
                Some(event) = event_rx.recv() => {
                    self.handle_event(event).await?;
                }
            }
        }

        drop(event_rx);

        // Best-effort join: the forwarder may be parked in recv() until the
        // next hotkey event.
        match tokio::time::timeout(Duration::from_secs(1), handle).await {
            Ok(Ok(())) => debug!("Hotkey event forwarder stopped cleanly"),
            Ok(Err(e)) => warn!(error = ?e, "Hotkey event forwarder task panicked"),
            Err(_) => debug!(
                "Hotkey event forwarder did not stop within timeout, \
                   will be cleaned up on exit"
            ),
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn handle_event(&self, event: GlobalHotKeyEvent) -> AppResult<()> {
        let Some(command) = self.hotkeys.command_for(event.id, event.state) else {
            return Ok(());
        };

        debug!(command = ?command, "Hotkey mapped to command");

        self.session.send(command).await?;

        Ok(())
    }
}
