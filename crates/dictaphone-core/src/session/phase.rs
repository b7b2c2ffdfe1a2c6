use std::fmt;

use tokio::time::Instant;
use uuid::Uuid;

/// Discrete phase of the dictation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// No connection, ready for the next start signal.
    Idle,
    /// Connected and streaming microphone audio.
    Recording,
    /// Stop sent, waiting for the backend's transcript.
    AwaitingResponse,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Idle => write!(f, "Idle"),
            SessionPhase::Recording => write!(f, "Recording"),
            SessionPhase::AwaitingResponse => write!(f, "AwaitingResponse"),
        }
    }
}

/// How the most recent session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Transcript received and handed to the injector.
    Delivered,
    /// No transcript before the response deadline.
    TimedOut,
    /// The backend closed or broke the stream.
    ConnectionLost,
    /// The session never reached `Recording`.
    ConnectFailed {
        /// Why the connection could not be established.
        reason: String,
    },
    /// Torn down by application shutdown.
    Aborted,
}

/// Read-only view of the session for observers.
///
/// Published after every processed event; readers may see a value that is
/// one step behind the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    /// Current phase.
    pub phase: SessionPhase,
    /// Session in progress or being connected, if any.
    pub session_id: Option<Uuid>,
    /// Response deadline while awaiting the transcript.
    pub deadline: Option<Instant>,
    /// A connect is in flight; the phase is still `Idle`.
    pub connecting: bool,
    /// Result of the last finished session.
    pub last_outcome: Option<SessionOutcome>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
            session_id: None,
            deadline: None,
            connecting: false,
            last_outcome: None,
        }
    }
}

impl SessionSnapshot {
    /// Whether a session is connecting or recording, i.e. a stop would take effect.
    pub fn is_capturing(&self) -> bool {
        self.connecting || self.phase == SessionPhase::Recording
    }
}
