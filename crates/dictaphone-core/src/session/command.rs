/// Signals delivered to the session controller by the hotkey layer.
///
/// Hold maps to start and stop; toggle is resolved by the controller against
/// its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// Begin a new session if none is active.
    StartRequested,
    /// Stop capturing and wait for the transcript.
    StopRequested,
    /// Start when idle, stop when connecting or recording, ignored while a
    /// transcript is pending. Resolved against the controller's own state, so
    /// two quick presses always pair up.
    Toggle,
    /// Tear down any live session and stop the controller.
    Shutdown,
}
