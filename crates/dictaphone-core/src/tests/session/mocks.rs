//! Hand-written collaborators for driving the controller under paused time.

use crate::{
    AudioChunk, AudioSink, AudioSource, Connection, ControlFrame, CoreError, CoreResult,
    EventSink, HistoryEntry, HistoryLog, SessionCommand, SessionController, SessionDeps,
    SessionHandle, SessionSettings, SessionSnapshot, TextInjector, Transport, TransportEvent,
};

use std::{
    panic::Location,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use error_location::ErrorLocation;
use tokio::{
    sync::{Notify, mpsc, watch},
    task::JoinHandle,
    time::timeout,
};
use uuid::Uuid;

pub(super) const ENDPOINT: &str = "ws://backend.test/stream";

const WAIT_LIMIT: Duration = Duration::from_secs(60);

/// Everything the collaborators observed.
#[derive(Default)]
pub(super) struct Recorder {
    pub endpoints: Vec<String>,
    pub sinks: Vec<EventSink>,
    pub controls: Vec<(Uuid, ControlFrame)>,
    pub disconnects: Vec<Uuid>,
    pub devices: Vec<Option<String>>,
    pub audio_starts: usize,
    pub audio_stops: usize,
    pub injected: Vec<String>,
    pub history: Vec<String>,
}

/// Switches for failure paths.
#[derive(Default)]
pub(super) struct Faults {
    pub connect_fails: AtomicBool,
    pub close_on_connect: AtomicBool,
    pub audio_fails: AtomicBool,
    /// Audio start waits for `audio_open` before it resolves.
    pub audio_gated: AtomicBool,
    pub audio_open: Notify,
    pub inject_fails: AtomicBool,
    pub inject_hangs: AtomicBool,
    pub history_fails: AtomicBool,
}

type Shared = Arc<Mutex<Recorder>>;

fn lock(recorder: &Shared) -> MutexGuard<'_, Recorder> {
    recorder.lock().unwrap_or_else(|e| e.into_inner())
}

struct MockTransport {
    recorder: Shared,
    faults: Arc<Faults>,
    connect_delay: Duration,
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, endpoint: &str, events: EventSink) -> CoreResult<Box<dyn Connection>> {
        let session_id = events.session_id();
        {
            let mut rec = lock(&self.recorder);
            rec.endpoints.push(endpoint.to_string());
            rec.sinks.push(events.clone());
        }

        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }

        // Backend hangs up mid-handshake: the event beats the connect result.
        if self.faults.close_on_connect.load(Ordering::SeqCst) {
            assert!(events.emit(TransportEvent::ConnectionClosed).await);
        }

        if self.faults.connect_fails.load(Ordering::SeqCst) {
            return Err(CoreError::ConnectFailed {
                endpoint: endpoint.to_string(),
                reason: "connection refused".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let (audio_sink, audio_rx) = AudioSink::channel(64);
        Ok(Box::new(MockConnection {
            session_id,
            audio_sink,
            _audio_rx: audio_rx,
            recorder: Arc::clone(&self.recorder),
        }))
    }
}

pub(super) struct MockConnection {
    session_id: Uuid,
    audio_sink: AudioSink,
    _audio_rx: mpsc::Receiver<AudioChunk>,
    recorder: Shared,
}

impl MockConnection {
    pub fn boxed(session_id: Uuid) -> Box<dyn Connection> {
        let (audio_sink, audio_rx) = AudioSink::channel(4);
        Box::new(Self {
            session_id,
            audio_sink,
            _audio_rx: audio_rx,
            recorder: Shared::default(),
        })
    }
}

#[async_trait]
impl Connection for MockConnection {
    fn audio_sink(&self) -> AudioSink {
        self.audio_sink.clone()
    }

    fn send_control(&mut self, frame: ControlFrame) -> CoreResult<()> {
        lock(&self.recorder).controls.push((self.session_id, frame));
        Ok(())
    }

    async fn disconnect(&mut self) -> CoreResult<()> {
        lock(&self.recorder).disconnects.push(self.session_id);
        Ok(())
    }
}

struct MockAudio {
    recorder: Shared,
    faults: Arc<Faults>,
}

#[async_trait]
impl AudioSource for MockAudio {
    fn select_device(&mut self, device_id: Option<String>) {
        lock(&self.recorder).devices.push(device_id);
    }

    async fn start(&mut self, _sink: AudioSink) -> CoreResult<()> {
        if self.faults.audio_gated.load(Ordering::SeqCst) {
            self.faults.audio_open.notified().await;
        }
        if self.faults.audio_fails.load(Ordering::SeqCst) {
            return Err(CoreError::NoMicrophoneFound {
                location: ErrorLocation::from(Location::caller()),
            });
        }
        lock(&self.recorder).audio_starts += 1;
        Ok(())
    }

    fn stop(&mut self) {
        lock(&self.recorder).audio_stops += 1;
    }
}

struct MockInjector {
    recorder: Shared,
    faults: Arc<Faults>,
}

#[async_trait]
impl TextInjector for MockInjector {
    async fn inject(&self, text: &str) -> CoreResult<()> {
        if self.faults.inject_hangs.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.faults.inject_fails.load(Ordering::SeqCst) {
            return Err(CoreError::InjectionFailed {
                reason: "no focused window".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        lock(&self.recorder).injected.push(text.to_string());
        Ok(())
    }
}

struct MemoryHistory {
    recorder: Shared,
    faults: Arc<Faults>,
}

impl HistoryLog for MemoryHistory {
    fn append(&self, text: &str) -> CoreResult<HistoryEntry> {
        if self.faults.history_fails.load(Ordering::SeqCst) {
            return Err(CoreError::History {
                reason: "disk full".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        lock(&self.recorder).history.push(text.to_string());
        Ok(HistoryEntry::new(text))
    }
}

/// A running controller wired to mocks.
pub(super) struct Harness {
    pub handle: SessionHandle,
    pub snapshots: watch::Receiver<SessionSnapshot>,
    pub settings_tx: watch::Sender<SessionSettings>,
    pub faults: Arc<Faults>,
    pub task: JoinHandle<CoreResult<()>>,
    recorder: Shared,
}

impl Harness {
    pub fn start() -> Self {
        Self::with_connect_delay(Duration::ZERO)
    }

    pub fn with_connect_delay(connect_delay: Duration) -> Self {
        let recorder = Shared::default();
        let faults = Arc::new(Faults::default());

        let deps = SessionDeps {
            transport: Arc::new(MockTransport {
                recorder: Arc::clone(&recorder),
                faults: Arc::clone(&faults),
                connect_delay,
            }),
            audio: Box::new(MockAudio {
                recorder: Arc::clone(&recorder),
                faults: Arc::clone(&faults),
            }),
            injector: Arc::new(MockInjector {
                recorder: Arc::clone(&recorder),
                faults: Arc::clone(&faults),
            }),
            history: Arc::new(MemoryHistory {
                recorder: Arc::clone(&recorder),
                faults: Arc::clone(&faults),
            }),
        };

        let (settings_tx, settings_rx) = watch::channel(SessionSettings {
            endpoint_url: Some(ENDPOINT.to_string()),
            selected_device: None,
        });

        let (controller, handle) = SessionController::new(deps, settings_rx);
        let snapshots = handle.subscribe();
        let task = tokio::spawn(controller.run());

        Self {
            handle,
            snapshots,
            settings_tx,
            faults,
            task,
            recorder,
        }
    }

    pub fn recorder(&self) -> MutexGuard<'_, Recorder> {
        lock(&self.recorder)
    }

    #[allow(clippy::unwrap_used)]
    pub async fn send(&self, command: SessionCommand) {
        self.handle.send(command).await.unwrap();
    }

    /// Wait until a published snapshot satisfies `predicate`.
    #[allow(clippy::unwrap_used)]
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&SessionSnapshot) -> bool,
    ) -> SessionSnapshot {
        timeout(WAIT_LIMIT, self.snapshots.wait_for(predicate))
            .await
            .unwrap()
            .unwrap()
            .clone()
    }

    /// Deliver `event` through the event sink handed to connect number `index`.
    pub async fn emit(&self, index: usize, event: TransportEvent) {
        let sink = self.recorder().sinks[index].clone();
        assert!(sink.emit(event).await);
    }

    /// Start a session and wait until it is recording.
    pub async fn record(&mut self) -> SessionSnapshot {
        self.send(SessionCommand::StartRequested).await;
        self.wait_for(|s| s.phase == crate::SessionPhase::Recording)
            .await
    }

    /// Start, then stop, and wait until the transcript is awaited.
    pub async fn record_and_stop(&mut self) -> SessionSnapshot {
        self.record().await;
        self.send(SessionCommand::StopRequested).await;
        self.wait_for(|s| s.phase == crate::SessionPhase::AwaitingResponse)
            .await
    }
}

/// Let every runnable task make progress.
///
/// Under paused time the clock only advances once all tasks are idle, so a
/// short sleep returns after the controller has drained its queues.
pub(super) async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
