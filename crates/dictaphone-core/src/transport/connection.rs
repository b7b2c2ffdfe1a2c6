use crate::{
    CoreResult,
    audio::AudioSink,
    transport::{ControlFrame, EventSink},
};

use async_trait::async_trait;

/// Opens streaming connections to a transcription backend.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establish a stream to `endpoint`.
    ///
    /// Inbound events for the new connection are delivered through `events`.
    /// Callers must not connect while a session is already active; the
    /// transport does not guard against it.
    async fn connect(&self, endpoint: &str, events: EventSink) -> CoreResult<Box<dyn Connection>>;
}

/// One live stream to the backend.
#[async_trait]
pub trait Connection: Send {
    /// Sink for captured audio bound for this stream.
    fn audio_sink(&self) -> AudioSink;

    /// Queue a control frame. Best-effort: callers log failures and move on.
    fn send_control(&mut self, frame: ControlFrame) -> CoreResult<()>;

    /// Release the stream. Safe to call more than once.
    async fn disconnect(&mut self) -> CoreResult<()>;
}
