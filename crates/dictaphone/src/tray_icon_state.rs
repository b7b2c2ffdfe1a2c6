use dictaphone_core::{SessionOutcome, SessionPhase, SessionSnapshot};

/// Tray icon states following the dictation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayIconState {
    /// Ready for the next session.
    Idle,
    /// Connecting or streaming microphone audio.
    Recording,
    /// Waiting for the backend's transcript.
    Processing,
    /// Idle, but the last session ended without a transcript.
    Attention,
}

impl TrayIconState {
    /// Tooltip shown for this state.
    pub fn tooltip(self) -> &'static str {
        match self {
            TrayIconState::Idle => "Dictaphone - Ready",
            TrayIconState::Recording => "Dictaphone - Recording...",
            TrayIconState::Processing => "Dictaphone - Transcribing...",
            TrayIconState::Attention => "Dictaphone - Last dictation failed, see logs",
        }
    }

    /// Icon fill colour as RGB.
    pub fn colour(self) -> [u8; 3] {
        match self {
            TrayIconState::Idle => [0x6b, 0x72, 0x80],
            TrayIconState::Recording => [0xdc, 0x26, 0x26],
            TrayIconState::Processing => [0xf5, 0x9e, 0x0b],
            TrayIconState::Attention => [0x7c, 0x3a, 0xed],
        }
    }
}

impl From<&SessionSnapshot> for TrayIconState {
    fn from(snapshot: &SessionSnapshot) -> Self {
        if snapshot.is_capturing() {
            return TrayIconState::Recording;
        }

        match snapshot.phase {
            SessionPhase::AwaitingResponse => TrayIconState::Processing,
            SessionPhase::Recording => TrayIconState::Recording,
            SessionPhase::Idle => match snapshot.last_outcome {
                Some(SessionOutcome::TimedOut)
                | Some(SessionOutcome::ConnectionLost)
                | Some(SessionOutcome::ConnectFailed { .. }) => TrayIconState::Attention,
                _ => TrayIconState::Idle,
            },
        }
    }
}
