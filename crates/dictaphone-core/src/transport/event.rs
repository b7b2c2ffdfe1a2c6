use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// Inbound events from an active connection.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The backend delivered a dedicated transcript.
    TranscriptReceived {
        /// Recognized text.
        text: String,
    },
    /// The backend sent an application-level message.
    ///
    /// Only counts as a transcript when it matches
    /// `{"type": "transcript", "text": <string>}`.
    ServerMessage {
        /// Raw message payload.
        payload: Value,
    },
    /// The remote side closed the stream.
    ConnectionClosed,
    /// The stream failed.
    ConnectionError {
        /// Description of the failure.
        reason: String,
    },
}

/// A [`TransportEvent`] tagged with the session whose connection produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedEvent {
    /// Session the originating connection belongs to.
    pub session_id: Uuid,
    /// The event itself.
    pub event: TransportEvent,
}

/// Where a connection delivers its inbound events.
///
/// Every event is tagged with the session id the sink was created for, so the
/// controller can drop events from connections it has already released.
#[derive(Debug, Clone)]
pub struct EventSink {
    session_id: Uuid,
    tx: mpsc::Sender<TaggedEvent>,
}

impl EventSink {
    /// Create a sink for `session_id` feeding `tx`.
    pub fn new(session_id: Uuid, tx: mpsc::Sender<TaggedEvent>) -> Self {
        Self { session_id, tx }
    }

    /// Session this sink tags events with.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Deliver an event to the controller.
    ///
    /// Returns `false` once the controller is gone.
    pub async fn emit(&self, event: TransportEvent) -> bool {
        let tagged = TaggedEvent {
            session_id: self.session_id,
            event,
        };

        if self.tx.send(tagged).await.is_err() {
            debug!(session_id = %self.session_id, "Event receiver dropped");
            return false;
        }

        true
    }
}
