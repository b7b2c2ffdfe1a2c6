use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::trace;

/// A block of mono samples captured at `sample_rate`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    /// Mono samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    /// Rate the samples were captured at.
    pub sample_rate: u32,
}

/// Bounded, non-blocking hand-off from the capture thread to a connection.
///
/// `push` never blocks: the audio callback runs on a realtime thread, so a
/// full queue drops the chunk instead of stalling capture.
#[derive(Debug, Clone)]
pub struct AudioSink {
    tx: mpsc::Sender<AudioChunk>,
}

impl AudioSink {
    /// Create a sink and the receiver that drains it.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<AudioChunk>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Offer a chunk. Returns `false` if it was dropped.
    pub fn push(&self, chunk: AudioChunk) -> bool {
        match self.tx.try_send(chunk) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                trace!("Audio queue full, dropping chunk");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Whether the receiving connection is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
