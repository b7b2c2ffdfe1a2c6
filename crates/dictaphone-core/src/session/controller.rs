//! Session controller: the single decision loop behind every dictation.
//!
//! Hotkey commands, transport events, connect results and watchdog expiry all
//! arrive on channels and are handled one at a time by [`SessionController::run`].
//! Nothing else mutates the session, so at most one session can ever be live.

use crate::{
    CoreError, CoreResult,
    audio::AudioSource,
    history::HistoryLog,
    inject::TextInjector,
    session::{
        SessionCommand, SessionOutcome, SessionPhase, SessionSnapshot, Watchdog,
        state::{Released, SessionState},
    },
    settings::SessionSettings,
    transport::{
        Connection, ControlFrame, EventSink, TaggedEvent, Transport, TransportEvent,
        parse_transcript,
    },
};

use std::{panic::Location, sync::Arc, time::Duration};

use error_location::ErrorLocation;
use tokio::{
    sync::{mpsc, watch},
    task::JoinSet,
    time::{Instant, timeout},
};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Longest wait for a transcript after the stop frame is sent.
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest wait for the injector before moving on.
pub const INJECTION_TIMEOUT: Duration = Duration::from_secs(5);

const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(3);
const HISTORY_TIMEOUT: Duration = Duration::from_secs(2);
const SHUTDOWN_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);
const COMMAND_QUEUE_CAPACITY: usize = 32;
const EVENT_QUEUE_CAPACITY: usize = 64;

/// Collaborators the controller drives.
pub struct SessionDeps {
    /// Opens backend connections.
    pub transport: Arc<dyn Transport>,
    /// Microphone capture.
    pub audio: Box<dyn AudioSource>,
    /// Delivers transcripts to the input focus.
    pub injector: Arc<dyn TextInjector>,
    /// Records delivered transcripts.
    pub history: Arc<dyn HistoryLog>,
}

enum InternalEvent {
    ConnectResolved {
        session_id: Uuid,
        result: CoreResult<Box<dyn Connection>>,
    },
    WatchdogFired {
        session_id: Uuid,
    },
}

/// A connect in flight. The phase stays `Idle` until it succeeds.
struct PendingConnect {
    session_id: Uuid,
    selected_device: Option<String>,
    stop_requested: bool,
    /// Events the new connection emitted before its connect resolved,
    /// replayed in order once it is `Recording`.
    early_events: Vec<TransportEvent>,
}

/// Cloneable front door to a running [`SessionController`].
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<SessionCommand>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Deliver a command to the controller.
    pub async fn send(&self, command: SessionCommand) -> CoreResult<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| CoreError::ControllerStopped {
                location: ErrorLocation::from(Location::caller()),
            })
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Subscribe to snapshot updates.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }
}

/// Owns the session state and drives it through its phases.
pub struct SessionController {
    transport: Arc<dyn Transport>,
    audio: Box<dyn AudioSource>,
    injector: Arc<dyn TextInjector>,
    history: Arc<dyn HistoryLog>,
    settings: watch::Receiver<SessionSettings>,

    state: SessionState,
    pending: Option<PendingConnect>,
    last_outcome: Option<SessionOutcome>,

    command_rx: mpsc::Receiver<SessionCommand>,
    internal_tx: mpsc::Sender<InternalEvent>,
    internal_rx: mpsc::Receiver<InternalEvent>,
    transport_tx: mpsc::Sender<TaggedEvent>,
    transport_rx: mpsc::Receiver<TaggedEvent>,
    snapshot_tx: watch::Sender<SessionSnapshot>,

    /// Disconnects in progress; drained on shutdown.
    closing: JoinSet<()>,
}

impl SessionController {
    /// Build a controller in `Idle` and the handle used to drive it.
    pub fn new(
        deps: SessionDeps,
        settings: watch::Receiver<SessionSettings>,
    ) -> (Self, SessionHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (internal_tx, internal_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let (transport_tx, transport_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());

        let controller = Self {
            transport: deps.transport,
            audio: deps.audio,
            injector: deps.injector,
            history: deps.history,
            settings,
            state: SessionState::Idle,
            pending: None,
            last_outcome: None,
            command_rx,
            internal_tx,
            internal_rx,
            transport_tx,
            transport_rx,
            snapshot_tx,
            closing: JoinSet::new(),
        };

        let handle = SessionHandle {
            command_tx,
            snapshot_rx,
        };

        (controller, handle)
    }

    /// Process events until shutdown or until every handle is dropped.
    #[instrument(skip(self))]
    pub async fn run(mut self) -> CoreResult<()> {
        info!("Session controller started");

        loop {
            // Fixed priority: a transcript already queued beats a watchdog
            // fire or connect result that became ready at the same time.
            tokio::select! {
                biased;

                command = self.command_rx.recv() => {
                    match command {
                        Some(SessionCommand::StartRequested) => self.on_start_requested(),
                        Some(SessionCommand::StopRequested) => self.on_stop_requested(),
                        Some(SessionCommand::Toggle) => self.on_toggle(),
                        Some(SessionCommand::Shutdown) => {
                            info!("Shutdown requested");
                            break;
                        }
                        None => {
                            info!("All session handles dropped, shutting down");
                            break;
                        }
                    }
                }

                Some(tagged) = self.transport_rx.recv() => {
                    self.on_transport_event(tagged).await;
                }

                Some(event) = self.internal_rx.recv() => {
                    self.on_internal_event(event).await;
                }

                Some(joined) = self.closing.join_next(), if !self.closing.is_empty() => {
                    if let Err(e) = joined {
                        warn!(error = ?e, "Disconnect task panicked");
                    }
                }
            }

            self.publish();
        }

        self.teardown().await;

        Ok(())
    }

    fn on_start_requested(&mut self) {
        if let Some(pending) = &self.pending {
            debug!(session_id = %pending.session_id, "Start ignored, connect in flight");
            return;
        }

        if let Some(session_id) = self.state.session_id() {
            debug!(
                session_id = %session_id,
                phase = %self.state.phase(),
                "Start ignored, session active"
            );
            return;
        }

        // Settings are read here and nowhere else; edits apply to the next session.
        let settings = self.settings.borrow().clone();

        let endpoint = match settings.endpoint() {
            Ok(endpoint) => endpoint.to_string(),
            Err(e) => {
                warn!(error = ?e, "Cannot start session");
                self.last_outcome = Some(SessionOutcome::ConnectFailed {
                    reason: e.to_string(),
                });
                return;
            }
        };

        let session_id = Uuid::new_v4();
        self.pending = Some(PendingConnect {
            session_id,
            selected_device: settings.selected_device,
            stop_requested: false,
            early_events: Vec::new(),
        });

        let transport = Arc::clone(&self.transport);
        let events = EventSink::new(session_id, self.transport_tx.clone());
        let internal_tx = self.internal_tx.clone();

        info!(session_id = %session_id, endpoint = %endpoint, "Connecting");

        tokio::spawn(async move {
            let result = transport.connect(&endpoint, events).await;

            // Controller gone: nobody will ever own this connection, close it here.
            if let Err(mpsc::error::SendError(InternalEvent::ConnectResolved {
                result: Ok(mut connection),
                ..
            })) = internal_tx
                .send(InternalEvent::ConnectResolved { session_id, result })
                .await
            {
                let _ = connection.disconnect().await;
            }
        });
    }

    fn on_stop_requested(&mut self) {
        if let Some(pending) = self.pending.as_mut() {
            debug!(session_id = %pending.session_id, "Stop deferred until connected");
            pending.stop_requested = true;
            return;
        }

        match self.state.phase() {
            SessionPhase::Recording => self.begin_awaiting_response(),
            SessionPhase::AwaitingResponse => debug!("Stop ignored, already awaiting response"),
            SessionPhase::Idle => debug!("Stop ignored, no active session"),
        }
    }

    fn on_toggle(&mut self) {
        let capturing = self.pending.is_some() || self.state.phase() == SessionPhase::Recording;

        if capturing {
            self.on_stop_requested();
        } else {
            self.on_start_requested();
        }
    }

    async fn on_internal_event(&mut self, event: InternalEvent) {
        match event {
            InternalEvent::ConnectResolved { session_id, result } => {
                self.on_connect_resolved(session_id, result).await;
            }
            InternalEvent::WatchdogFired { session_id } => {
                if !self.state.is_awaiting(session_id) {
                    debug!(session_id = %session_id, "Ignoring stale watchdog");
                    return;
                }

                warn!(session_id = %session_id, "No transcript before deadline");
                self.end_session(SessionOutcome::TimedOut);
            }
        }
    }

    async fn on_connect_resolved(
        &mut self,
        session_id: Uuid,
        result: CoreResult<Box<dyn Connection>>,
    ) {
        let pending = match self.pending.take() {
            Some(pending) if pending.session_id == session_id => pending,
            other => {
                self.pending = other;
                if let Ok(connection) = result {
                    debug!(session_id = %session_id, "Releasing connection nobody is waiting for");
                    self.spawn_disconnect(session_id, connection);
                }
                return;
            }
        };

        let connection = match result {
            Ok(connection) => connection,
            Err(e) => {
                error!(
                    session_id = %session_id,
                    error = ?e,
                    dropped_events = pending.early_events.len(),
                    "Failed to connect"
                );
                self.last_outcome = Some(SessionOutcome::ConnectFailed {
                    reason: e.to_string(),
                });
                return;
            }
        };

        self.audio.select_device(pending.selected_device);

        if let Err(e) = self.audio.start(connection.audio_sink()).await {
            error!(session_id = %session_id, error = ?e, "Failed to start audio capture");
            self.last_outcome = Some(SessionOutcome::ConnectFailed {
                reason: e.to_string(),
            });
            self.spawn_disconnect(session_id, connection);
            return;
        }

        self.state = SessionState::Recording {
            session_id,
            started_at: Instant::now(),
            connection,
        };

        info!(session_id = %session_id, "Recording started");

        for event in pending.early_events {
            self.on_transport_event(TaggedEvent { session_id, event }).await;
        }

        // A replayed close may already have ended the session.
        if pending.stop_requested && self.state.is_current(session_id) {
            self.begin_awaiting_response();
        }
    }

    /// `Recording` -> `AwaitingResponse`: stop capture, send the stop frame,
    /// arm the watchdog. The transition happens even if the frame cannot be
    /// sent; the watchdog still bounds the wait.
    fn begin_awaiting_response(&mut self) {
        let (session_id, started_at, mut connection) =
            match std::mem::replace(&mut self.state, SessionState::Idle) {
                SessionState::Recording {
                    session_id,
                    started_at,
                    connection,
                } => (session_id, started_at, connection),
                other => {
                    self.state = other;
                    return;
                }
            };

        self.audio.stop();

        if let Err(e) = connection.send_control(ControlFrame::StopRecording) {
            warn!(session_id = %session_id, error = ?e, "Failed to send stop-recording");
        }

        let internal_tx = self.internal_tx.clone();
        let watchdog = Watchdog::arm(RESPONSE_TIMEOUT, async move {
            let _ = internal_tx
                .send(InternalEvent::WatchdogFired { session_id })
                .await;
        });

        info!(
            session_id = %session_id,
            recording_ms = started_at.elapsed().as_millis() as u64,
            "Recording stopped, awaiting transcript"
        );

        self.state = SessionState::AwaitingResponse {
            session_id,
            started_at,
            connection,
            watchdog,
        };
    }

    async fn on_transport_event(&mut self, tagged: TaggedEvent) {
        if let Some(pending) = self.pending.as_mut()
            && pending.session_id == tagged.session_id
        {
            debug!(
                session_id = %tagged.session_id,
                event = ?tagged.event,
                "Holding event until connect resolves"
            );
            pending.early_events.push(tagged.event);
            return;
        }

        if !self.state.is_current(tagged.session_id) {
            debug!(
                session_id = %tagged.session_id,
                event = ?tagged.event,
                "Ignoring event from released connection"
            );
            return;
        }

        match tagged.event {
            TransportEvent::TranscriptReceived { text } => self.on_transcript(text).await,
            TransportEvent::ServerMessage { payload } => match parse_transcript(&payload) {
                Some(text) => self.on_transcript(text.to_string()).await,
                None => debug!(payload = %payload, "Ignoring non-transcript server message"),
            },
            TransportEvent::ConnectionClosed => {
                warn!(session_id = %tagged.session_id, "Backend closed the connection");
                self.end_session(SessionOutcome::ConnectionLost);
            }
            TransportEvent::ConnectionError { reason } => {
                error!(session_id = %tagged.session_id, reason = %reason, "Connection failed");
                self.end_session(SessionOutcome::ConnectionLost);
            }
        }
    }

    /// `AwaitingResponse` -> `Idle` with a transcript: disarm, inject, record,
    /// then release the connection.
    async fn on_transcript(&mut self, text: String) {
        if self.state.phase() != SessionPhase::AwaitingResponse {
            debug!(phase = %self.state.phase(), "Transcript outside awaiting phase ignored");
            return;
        }

        let Some(released) = self.state.release() else {
            return;
        };
        let Released {
            session_id,
            started_at,
            connection,
            watchdog,
            ..
        } = released;

        if let Some(watchdog) = watchdog {
            watchdog.disarm();
        }

        match timeout(INJECTION_TIMEOUT, self.injector.inject(&text)).await {
            Ok(Ok(())) => debug!(session_id = %session_id, text_len = text.len(), "Text injected"),
            Ok(Err(e)) => error!(session_id = %session_id, error = ?e, "Injection failed"),
            Err(_) => error!(session_id = %session_id, "Injection timed out"),
        }

        // The words were spoken even if the cursor never got them.
        let history = Arc::clone(&self.history);
        let record = text.clone();
        match timeout(
            HISTORY_TIMEOUT,
            tokio::task::spawn_blocking(move || history.append(&record)),
        )
        .await
        {
            Ok(Ok(Ok(entry))) => {
                debug!(session_id = %session_id, entry_id = %entry.id, "History updated");
            }
            Ok(Ok(Err(e))) => error!(session_id = %session_id, error = ?e, "Failed to append history"),
            Ok(Err(e)) => error!(session_id = %session_id, error = ?e, "History task panicked"),
            Err(_) => error!(session_id = %session_id, "History append timed out"),
        }

        self.spawn_disconnect(session_id, connection);
        self.last_outcome = Some(SessionOutcome::Delivered);

        info!(
            session_id = %session_id,
            duration_ms = started_at.elapsed().as_millis() as u64,
            text_len = text.len(),
            "Transcript delivered"
        );
    }

    /// Return to `Idle` without a transcript.
    fn end_session(&mut self, outcome: SessionOutcome) {
        let Some(released) = self.state.release() else {
            return;
        };

        if released.phase == SessionPhase::Recording {
            self.audio.stop();
        }
        if let Some(watchdog) = released.watchdog {
            watchdog.disarm();
        }

        info!(
            session_id = %released.session_id,
            duration_ms = released.started_at.elapsed().as_millis() as u64,
            outcome = ?outcome,
            "Session ended"
        );

        self.spawn_disconnect(released.session_id, released.connection);
        self.last_outcome = Some(outcome);
    }

    /// Best-effort disconnect off the decision path.
    fn spawn_disconnect(&mut self, session_id: Uuid, mut connection: Box<dyn Connection>) {
        self.closing.spawn(async move {
            match timeout(DISCONNECT_TIMEOUT, connection.disconnect()).await {
                Ok(Ok(())) => debug!(session_id = %session_id, "Connection released"),
                Ok(Err(e)) => {
                    warn!(session_id = %session_id, error = ?e, "Disconnect failed, treating connection as gone");
                }
                Err(_) => {
                    warn!(session_id = %session_id, "Disconnect timed out, treating connection as gone");
                }
            }
        });
    }

    fn publish(&self) {
        let next = SessionSnapshot {
            phase: self.state.phase(),
            session_id: self
                .state
                .session_id()
                .or(self.pending.as_ref().map(|p| p.session_id)),
            deadline: self.state.deadline(),
            connecting: self.pending.is_some(),
            last_outcome: self.last_outcome.clone(),
        };

        self.snapshot_tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    async fn teardown(&mut self) {
        // A connect still in flight finds the controller gone and closes itself.
        self.pending = None;

        if let Some(released) = self.state.release() {
            if released.phase == SessionPhase::Recording {
                self.audio.stop();
            }
            if let Some(watchdog) = released.watchdog {
                watchdog.disarm();
            }

            let mut connection = released.connection;
            match timeout(DISCONNECT_TIMEOUT, connection.disconnect()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = ?e, "Disconnect failed during shutdown"),
                Err(_) => warn!("Disconnect timed out during shutdown"),
            }

            info!(session_id = %released.session_id, "Live session aborted by shutdown");
            self.last_outcome = Some(SessionOutcome::Aborted);
        }

        let drained = timeout(SHUTDOWN_DRAIN_TIMEOUT, async {
            while self.closing.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            info!("Pending disconnects did not finish within timeout, aborting them");
            self.closing.abort_all();
        }

        self.publish();
        info!("Session controller stopped");
    }
}
