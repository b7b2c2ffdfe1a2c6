//! Dictaphone: push-to-talk dictation into any application.

mod app;
mod config;
mod error;
mod hotkey_handler;
mod logging;
mod output_handler;
mod paste_key_guard;
mod tray_command;
mod tray_icon_state;
mod tray_manager;

pub(crate) use {
    app::App,
    error::{AppError, Result as AppResult},
    hotkey_handler::HotkeyHandler,
    output_handler::OutputHandler,
    paste_key_guard::PasteKeyGuard,
    tray_command::TrayCommand,
    tray_icon_state::TrayIconState,
    tray_manager::TrayManager,
};

use crate::config::Config;

use std::sync::Arc;

use dictaphone_core::{
    AudioCapturer, JsonlHistory, SessionController, SessionDeps, WsTransport,
    list_input_devices,
};
use global_hotkey::GlobalHotKeyManager;
use tao::{
    event::{Event, StartCause},
    event_loop::{ControlFlow, EventLoopBuilder},
};
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Application entry point.
fn main() {
    // Keeps the file writer flushing until exit.
    let _log_guard = logging::init();

    let event_loop = EventLoopBuilder::<TrayCommand>::with_user_event().build();
    let tray_proxy = event_loop.create_proxy();

    // TrayManager lives on the main thread - TrayIcon is !Send on all platforms.
    let mut tray_manager = or_exit(TrayManager::new(), "create tray icon");

    // Dropping the manager unregisters the hotkeys, so it lives in the closure.
    let mut hotkey_manager: Option<GlobalHotKeyManager> = None;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::UserEvent(cmd) => {
                match cmd {
                    TrayCommand::SetState(state) => {
                        if let Err(e) = tray_manager.update_state(state) {
                            error!(error = ?e, "Failed to update tray icon");
                        }
                    }
                    TrayCommand::Shutdown => {
                        *control_flow = ControlFlow::ExitWithCode(0);
                    }
                }
                return;
            }
            Event::NewEvents(StartCause::Init) => {
                let config = or_exit(Config::load(), "load config");

                match list_input_devices() {
                    Ok(devices) => {
                        for device in devices {
                            info!(
                                id = %device.id,
                                name = %device.name,
                                is_default = device.is_default,
                                "Input device available"
                            );
                        }
                    }
                    Err(e) => warn!(error = ?e, "Failed to enumerate input devices"),
                }

                let history = Arc::new(or_exit(
                    Config::history_path()
                        .and_then(|path| JsonlHistory::open(&path).map_err(AppError::from)),
                    "open history",
                ));

                let output = Arc::new(or_exit(
                    OutputHandler::new(config.behavior.auto_paste),
                    "open clipboard",
                ));

                let audio = or_exit(AudioCapturer::new(), "start audio thread");

                #[cfg(target_os = "macos")]
                unsafe {
                    use core_foundation::runloop::{CFRunLoopGetMain, CFRunLoopWakeUp};
                    CFRunLoopWakeUp(CFRunLoopGetMain());
                }

                // Hotkeys are registered on the main thread; tao's event loop
                // pumps the messages needed for WM_HOTKEY delivery on Windows.
                let (manager, hotkeys) = or_exit(
                    HotkeyHandler::register_hotkeys(&config.hotkeys),
                    "register hotkeys",
                );
                hotkey_manager = Some(manager);

                let tray_proxy = tray_proxy.clone();
                let menu_ids = tray_manager.menu_ids().clone();

                // Tokio runtime on its own thread; tray and hotkey manager stay here.
                std::thread::spawn(move || {
                    let rt = or_exit(tokio::runtime::Runtime::new(), "start tokio runtime");

                    rt.block_on(async {
                        let (settings_tx, settings_rx) = watch::channel(config.session_settings());
                        let (shutdown_tx, shutdown_rx) = watch::channel(false);

                        let deps = SessionDeps {
                            transport: Arc::new(WsTransport::default()),
                            audio: Box::new(audio),
                            injector: output.clone(),
                            history: history.clone(),
                        };

                        let (controller, session) = SessionController::new(deps, settings_rx);
                        let controller = tokio::spawn(controller.run());

                        let hotkey_handler = HotkeyHandler::new(hotkeys, session.clone());

                        let app = App {
                            session,
                            controller,
                            settings_tx,
                            config,
                            output,
                            history,
                            tray_proxy,
                            menu_ids,
                            shutdown_tx,
                        };

                        tokio::join!(
                            async {
                                if let Err(e) = hotkey_handler.run(shutdown_rx).await {
                                    error!(error = ?e, "Hotkey handler error");
                                }
                            },
                            async {
                                if let Err(e) = app.run().await {
                                    error!(error = ?e, "App error");
                                }
                            }
                        );
                    });
                });
            }
            _ => {}
        }

        let _ = &hotkey_manager;
    });
}

/// Startup steps the app cannot run without: log and exit on failure.
fn or_exit<T, E: std::fmt::Debug>(result: Result<T, E>, step: &str) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            error!(error = ?e, step, "Startup failed");
            std::process::exit(1);
        }
    }
}
