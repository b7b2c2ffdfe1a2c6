use crate::{
    session::{SessionPhase, Watchdog},
    transport::Connection,
};

use std::fmt;

use tokio::time::Instant;
use uuid::Uuid;

/// The one session record, owned by the controller.
///
/// Each variant carries exactly what its phase allows: a connection exists
/// only outside `Idle`, and a watchdog (with its deadline) only while
/// awaiting the response.
pub(crate) enum SessionState {
    Idle,
    Recording {
        session_id: Uuid,
        started_at: Instant,
        connection: Box<dyn Connection>,
    },
    AwaitingResponse {
        session_id: Uuid,
        started_at: Instant,
        connection: Box<dyn Connection>,
        watchdog: Watchdog,
    },
}

/// Resources handed back when a session returns to `Idle`.
pub(crate) struct Released {
    pub(crate) phase: SessionPhase,
    pub(crate) session_id: Uuid,
    pub(crate) started_at: Instant,
    pub(crate) connection: Box<dyn Connection>,
    pub(crate) watchdog: Option<Watchdog>,
}

impl SessionState {
    pub(crate) fn phase(&self) -> SessionPhase {
        match self {
            SessionState::Idle => SessionPhase::Idle,
            SessionState::Recording { .. } => SessionPhase::Recording,
            SessionState::AwaitingResponse { .. } => SessionPhase::AwaitingResponse,
        }
    }

    pub(crate) fn session_id(&self) -> Option<Uuid> {
        match self {
            SessionState::Idle => None,
            SessionState::Recording { session_id, .. }
            | SessionState::AwaitingResponse { session_id, .. } => Some(*session_id),
        }
    }

    pub(crate) fn deadline(&self) -> Option<Instant> {
        match self {
            SessionState::AwaitingResponse { watchdog, .. } => Some(watchdog.deadline()),
            _ => None,
        }
    }

    /// Whether `session_id` names the live session.
    pub(crate) fn is_current(&self, session_id: Uuid) -> bool {
        self.session_id() == Some(session_id)
    }

    /// Whether a watchdog fire for `session_id` should still end the session.
    ///
    /// False for a session that already ended, or a newer one that has not
    /// reached `AwaitingResponse`.
    pub(crate) fn is_awaiting(&self, session_id: Uuid) -> bool {
        matches!(
            self,
            SessionState::AwaitingResponse { session_id: current, .. } if *current == session_id
        )
    }

    /// Move to `Idle`, returning the connection and watchdog to release.
    pub(crate) fn release(&mut self) -> Option<Released> {
        match std::mem::replace(self, SessionState::Idle) {
            SessionState::Idle => None,
            SessionState::Recording {
                session_id,
                started_at,
                connection,
            } => Some(Released {
                phase: SessionPhase::Recording,
                session_id,
                started_at,
                connection,
                watchdog: None,
            }),
            SessionState::AwaitingResponse {
                session_id,
                started_at,
                connection,
                watchdog,
            } => Some(Released {
                phase: SessionPhase::AwaitingResponse,
                session_id,
                started_at,
                connection,
                watchdog: Some(watchdog),
            }),
        }
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("phase", &self.phase())
            .field("session_id", &self.session_id())
            .field("deadline", &self.deadline())
            .finish()
    }
}
