use crate::{
    AppError, AppResult, OutputHandler, TrayCommand, TrayIconState, config::Config,
    tray_manager::TrayMenuIds,
};

use std::{panic::Location, sync::Arc, time::Duration};

use dictaphone_core::{CoreResult, JsonlHistory, SessionCommand, SessionHandle, SessionSettings};
use error_location::ErrorLocation;
use tao::event_loop::EventLoopProxy;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{error, info, instrument, warn};
use tray_icon::menu::MenuEvent;

const CONTROLLER_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Async side of the application.
///
/// Runs on the tokio runtime thread. Tray updates go back to the main thread
/// through `tray_proxy` because `TrayIcon` is `!Send` and must remain on the
/// UI thread.
pub struct App {
    pub(crate) session: SessionHandle,
    pub(crate) controller: JoinHandle<CoreResult<()>>,
    pub(crate) settings_tx: watch::Sender<SessionSettings>,
    pub(crate) config: Config,
    pub(crate) output: Arc<OutputHandler>,
    pub(crate) history: Arc<JsonlHistory>,
    pub(crate) tray_proxy: EventLoopProxy<TrayCommand>,
    pub(crate) menu_ids: TrayMenuIds,
    pub(crate) shutdown_tx: watch::Sender<bool>,
}

impl App {
    /// Run until Exit is chosen or the session controller stops.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("Dictaphone starting");

        // MenuEvent::receiver() is a blocking crossbeam receiver; one blocking
        // task forwards it and exits on the first send after tray_event_rx is
        // dropped.
        let (tray_event_tx, mut tray_event_rx) = mpsc::channel(32);
        let tray_handle = tokio::task::spawn_blocking(move || {
            let receiver = MenuEvent::receiver();
            while let Ok(event) = receiver.recv() {
                if tray_event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        let mut snapshots = self.session.subscribe();

        loop {
            tokio::select! {
                Some(event) = tray_event_rx.recv() => {
                    match self.handle_tray_event(event).await {
                        Ok(true) => break,
                        Ok(false) => {}
                        Err(e) => error!(error = ?e, "Failed to handle tray event"),
                    }
                }

                changed = snapshots.changed() => {
                    if changed.is_err() {
                        warn!("Session controller stopped unexpectedly");
                        break;
                    }
                    let state = TrayIconState::from(&*snapshots.borrow_and_update());
                    self.set_tray_state(state);
                }

                else => {
                    info!("All channels closed, shutting down");
                    break;
                }
            }
        }

        drop(tray_event_rx);

        self.stop_controller().await;

        match tokio::time::timeout(Duration::from_secs(1), tray_handle).await {
            Ok(Ok(())) => info!("Tray event forwarder stopped cleanly"),
            Ok(Err(e)) => error!(error = ?e, "Tray event forwarder task panicked"),
            Err(_) => info!(
                "Tray event forwarder did not stop within timeout, \
                     will be cleaned up on exit"
            ),
        }

        let _ = self.shutdown_tx.send(true);
        let _ = self.tray_proxy.send_event(TrayCommand::Shutdown);
        info!("Dictaphone shut down successfully");

        Ok(())
    }

    /// Handle a tray menu click. Returns `true` when the app should exit.
    #[instrument(skip(self))]
    async fn handle_tray_event(&mut self, event: MenuEvent) -> AppResult<bool> {
        let id = &event.id;

        if *id == self.menu_ids.settings {
            let path = Config::config_path()?;
            open::that(&path).map_err(|e| AppError::ConfigFile {
                path: path.clone(),
                reason: format!("cannot open in editor: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;
            info!(config_path = ?path, "Opened settings file");
        } else if *id == self.menu_ids.reload {
            self.reload_settings()?;
        } else if *id == self.menu_ids.copy_last {
            match self.history.recent(Some(1))?.into_iter().next() {
                Some(entry) => {
                    self.output.output_text(&entry.text, false).await?;
                    info!(entry_id = %entry.id, "Copied last transcript");
                }
                None => info!("History is empty, nothing to copy"),
            }
        } else if *id == self.menu_ids.clear_history {
            self.history.clear()?;
        } else if *id == self.menu_ids.exit {
            info!("Exit requested from tray menu");
            return Ok(true);
        }

        Ok(false)
    }

    /// Re-read the config file. Endpoint, device and auto-paste apply to the
    /// next session; hotkeys are bound at startup only.
    #[instrument(skip(self))]
    fn reload_settings(&mut self) -> AppResult<()> {
        let config = Config::load()?;

        if config.hotkeys != self.config.hotkeys {
            warn!("Hotkey changes take effect after restart");
        }

        self.output.set_auto_paste(config.behavior.auto_paste);
        self.settings_tx.send_replace(config.session_settings());

        info!(
            endpoint = %config.server.endpoint_url,
            device = ?config.audio.selected_device,
            auto_paste = config.behavior.auto_paste,
            "Settings reloaded"
        );

        self.config = config;

        Ok(())
    }

    fn set_tray_state(&self, state: TrayIconState) {
        if self
            .tray_proxy
            .send_event(TrayCommand::SetState(state))
            .is_err()
        {
            warn!(state = ?state, "Event loop closed, cannot update tray");
        }
    }

    /// Ask the controller to tear down any live session and wait for it.
    async fn stop_controller(&mut self) {
        if let Err(e) = self.session.send(SessionCommand::Shutdown).await {
            warn!(error = ?e, "Session controller already stopped");
        }

        match tokio::time::timeout(CONTROLLER_STOP_TIMEOUT, &mut self.controller).await {
            Ok(Ok(Ok(()))) => info!("Session controller stopped cleanly"),
            Ok(Ok(Err(e))) => error!(error = ?e, "Session controller failed"),
            Ok(Err(e)) => error!(error = ?e, "Session controller task panicked"),
            Err(_) => {
                warn!("Session controller did not stop within timeout, aborting");
                self.controller.abort();
            }
        }
    }
}
