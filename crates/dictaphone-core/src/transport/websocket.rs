//! WebSocket client transport.
//!
//! Audio goes out as binary PCM16 frames, control messages and backend events
//! as JSON text frames. Each connection runs one writer and one reader task.

use crate::{
    CoreError, CoreResult,
    audio::{AudioChunk, AudioSink, PcmEncoder},
    transport::{
        Connection, ControlFrame, EventSink, Transport, TransportEvent,
        message::{decode_inbound, encode_control},
    },
};

use std::{
    panic::Location,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use error_location::ErrorLocation;
use futures_util::{SinkExt, StreamExt, stream::SplitSink, stream::SplitStream};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    sync::mpsc,
    task::JoinHandle,
    time::timeout,
};
use tokio_tungstenite::{WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, error, info, instrument, trace, warn};
use uuid::Uuid;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);
const AUDIO_QUEUE_CAPACITY: usize = 64;
const CONTROL_QUEUE_CAPACITY: usize = 8;

/// Connects to the transcription backend over WebSocket.
#[derive(Debug, Clone)]
pub struct WsTransport {
    connect_timeout: Duration,
}

impl Default for WsTransport {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl WsTransport {
    /// Transport with a custom bound on connection setup.
    pub fn with_connect_timeout(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

#[async_trait]
impl Transport for WsTransport {
    #[instrument(skip(self, events), fields(session_id = %events.session_id()))]
    async fn connect(&self, endpoint: &str, events: EventSink) -> CoreResult<Box<dyn Connection>> {
        let (ws_stream, _response) = timeout(self.connect_timeout, connect_async(endpoint))
            .await
            .map_err(|_| CoreError::ConnectFailed {
                endpoint: endpoint.to_string(),
                reason: format!("timed out after {}s", self.connect_timeout.as_secs()),
                location: ErrorLocation::from(Location::caller()),
            })?
            .map_err(|e| CoreError::ConnectFailed {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!(endpoint, "Connected to transcription backend");

        Ok(Box::new(WsConnection::spawn(ws_stream, events)))
    }
}

enum Outbound {
    Control(ControlFrame),
    Close,
}

/// A live WebSocket stream to the backend.
pub struct WsConnection {
    session_id: Uuid,
    audio_sink: AudioSink,
    outbound_tx: mpsc::Sender<Outbound>,
    /// Set on local disconnect so the reader does not report our own close.
    closed: Arc<AtomicBool>,
    writer: Option<JoinHandle<()>>,
    reader: Option<JoinHandle<()>>,
}

impl WsConnection {
    /// Start the reader and writer tasks for an established stream.
    pub fn spawn<S>(ws_stream: WebSocketStream<S>, events: EventSink) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let session_id = events.session_id();
        let (write, read) = ws_stream.split();
        let (audio_sink, audio_rx) = AudioSink::channel(AUDIO_QUEUE_CAPACITY);
        let (outbound_tx, outbound_rx) = mpsc::channel(CONTROL_QUEUE_CAPACITY);
        let closed = Arc::new(AtomicBool::new(false));

        let writer = tokio::spawn(run_writer(
            write,
            audio_rx,
            outbound_rx,
            events.clone(),
            Arc::clone(&closed),
        ));
        let reader = tokio::spawn(run_reader(read, events, Arc::clone(&closed)));

        Self {
            session_id,
            audio_sink,
            outbound_tx,
            closed,
            writer: Some(writer),
            reader: Some(reader),
        }
    }
}

#[async_trait]
impl Connection for WsConnection {
    fn audio_sink(&self) -> AudioSink {
        self.audio_sink.clone()
    }

    #[track_caller]
    fn send_control(&mut self, frame: ControlFrame) -> CoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CoreError::SendFailed {
                reason: format!("connection closed, cannot send {}", frame.name()),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        self.outbound_tx
            .try_send(Outbound::Control(frame))
            .map_err(|e| CoreError::SendFailed {
                reason: format!("failed to queue {}: {}", frame.name(), e),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    #[instrument(skip(self), fields(session_id = %self.session_id))]
    async fn disconnect(&mut self) -> CoreResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            debug!("Already disconnected");
            return Ok(());
        }

        // Writer may already be gone if the socket failed.
        let _ = self.outbound_tx.try_send(Outbound::Close);

        let drained = match self.writer.take() {
            Some(writer) => timeout(WRITER_DRAIN_TIMEOUT, writer).await.is_ok(),
            None => true,
        };

        if let Some(reader) = self.reader.take() {
            reader.abort();
        }

        if !drained {
            return Err(CoreError::DisconnectFailed {
                reason: "writer did not finish closing in time".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        info!("Disconnected from transcription backend");

        Ok(())
    }
}

impl Drop for WsConnection {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::Release);
        if let Some(writer) = self.writer.take() {
            writer.abort();
        }
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

type WsSink<S> = SplitSink<WebSocketStream<S>, Message>;
type WsSource<S> = SplitStream<WebSocketStream<S>>;

async fn run_writer<S>(
    mut write: WsSink<S>,
    mut audio_rx: mpsc::Receiver<AudioChunk>,
    mut outbound_rx: mpsc::Receiver<Outbound>,
    events: EventSink,
    closed: Arc<AtomicBool>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let mut encoder = PcmEncoder::new();

    let result: CoreResult<()> = async {
        loop {
            tokio::select! {
                Some(chunk) = audio_rx.recv() => {
                    let pcm = encoder.encode(chunk)?;
                    send_audio(&mut write, pcm).await?;
                }
                outbound = outbound_rx.recv() => {
                    match outbound {
                        Some(Outbound::Control(frame)) => {
                            // Everything captured before the stop must reach the
                            // backend ahead of the control message.
                            while let Ok(chunk) = audio_rx.try_recv() {
                                let pcm = encoder.encode(chunk)?;
                                send_audio(&mut write, pcm).await?;
                            }
                            send_audio(&mut write, encoder.flush()?).await?;

                            let text = encode_control(frame)?;
                            write.send(Message::Text(text.into())).await.map_err(|e| {
                                CoreError::SendFailed {
                                    reason: e.to_string(),
                                    location: ErrorLocation::from(Location::caller()),
                                }
                            })?;
                            debug!(control = frame.name(), "Control frame sent");
                        }
                        Some(Outbound::Close) | None => {
                            let _ = write.send(Message::Close(None)).await;
                            let _ = write.close().await;
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
    .await;

    if let Err(e) = result {
        if closed.load(Ordering::Acquire) {
            debug!(error = ?e, "Writer stopped after local close");
            return;
        }
        error!(error = ?e, "WebSocket writer failed");
        events
            .emit(TransportEvent::ConnectionError {
                reason: e.to_string(),
            })
            .await;
    }
}

async fn send_audio<S>(write: &mut WsSink<S>, pcm: Vec<u8>) -> CoreResult<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    if pcm.is_empty() {
        return Ok(());
    }

    trace!(bytes = pcm.len(), "Sending audio frame");

    write
        .send(Message::Binary(pcm.into()))
        .await
        .map_err(|e| CoreError::SendFailed {
            reason: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
}

async fn run_reader<S>(mut read: WsSource<S>, events: EventSink, closed: Arc<AtomicBool>)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let terminal = loop {
        match read.next().await {
            Some(Ok(Message::Text(text))) => match decode_inbound(&text) {
                Some(event) => {
                    if !events.emit(event).await {
                        return;
                    }
                }
                None => trace!("Ignoring inbound message"),
            },
            Some(Ok(Message::Close(frame))) => {
                debug!(frame = ?frame, "Backend closed the stream");
                break TransportEvent::ConnectionClosed;
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                break TransportEvent::ConnectionError {
                    reason: e.to_string(),
                };
            }
            None => break TransportEvent::ConnectionClosed,
        }
    };

    if closed.load(Ordering::Acquire) {
        return;
    }

    warn!(event = ?terminal, "Connection ended by remote");
    events.emit(terminal).await;
}
