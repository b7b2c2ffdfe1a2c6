//! Dictaphone Core Library
//!
//! Push-to-talk dictation sessions: capture the microphone, stream it to a
//! transcription backend over a WebSocket, and deliver the transcript to the
//! focused application.
//!
//! # Example
//!
//! ```no_run
//! use dictaphone_core::{
//!     AudioCapturer, CoreResult, HistoryLog, JsonlHistory, SessionCommand, SessionController,
//!     SessionDeps, SessionSettings, TextInjector, WsTransport,
//! };
//!
//! use std::{path::Path, sync::Arc};
//!
//! use async_trait::async_trait;
//! use tokio::sync::watch;
//!
//! struct PrintInjector;
//!
//! #[async_trait]
//! impl TextInjector for PrintInjector {
//!     async fn inject(&self, text: &str) -> CoreResult<()> {
//!         println!("{}", text);
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> CoreResult<()> {
//!     let settings = SessionSettings {
//!         endpoint_url: Some("ws://localhost:8765".to_string()),
//!         selected_device: None,
//!     };
//!     let (_settings_tx, settings_rx) = watch::channel(settings);
//!
//!     let history: Arc<dyn HistoryLog> = Arc::new(JsonlHistory::open(Path::new("history.jsonl"))?);
//!     let deps = SessionDeps {
//!         transport: Arc::new(WsTransport::default()),
//!         audio: Box::new(AudioCapturer::new()?),
//!         injector: Arc::new(PrintInjector),
//!         history,
//!     };
//!
//!     let (controller, handle) = SessionController::new(deps, settings_rx);
//!     let task = tokio::spawn(controller.run());
//!
//!     handle.send(SessionCommand::StartRequested).await?;
//!     tokio::time::sleep(std::time::Duration::from_secs(3)).await;
//!     handle.send(SessionCommand::StopRequested).await?;
//!
//!     handle.send(SessionCommand::Shutdown).await?;
//!     let _ = task.await;
//!     Ok(())
//! }
//! ```

mod audio;
mod error;
mod history;
mod hotkey;
mod inject;
mod session;
mod settings;
mod transport;

pub use {
    audio::{
        AudioCapturer, AudioChunk, AudioDeviceInfo, AudioSink, AudioSource, PcmEncoder,
        WIRE_SAMPLE_RATE, list_input_devices, to_pcm16,
    },
    error::{CoreError, Result as CoreResult},
    history::{HistoryEntry, HistoryLog, JsonlHistory},
    hotkey::{HotkeyConfig, MODIFIER_NAMES},
    inject::TextInjector,
    session::{
        INJECTION_TIMEOUT, RESPONSE_TIMEOUT, SessionCommand, SessionController, SessionDeps,
        SessionHandle, SessionOutcome, SessionPhase, SessionSnapshot, Watchdog,
    },
    settings::SessionSettings,
    transport::{
        Connection, ControlFrame, EventSink, TaggedEvent, Transport, TransportEvent, WsConnection,
        WsTransport, parse_transcript,
    },
};

#[cfg(test)]
mod tests;
