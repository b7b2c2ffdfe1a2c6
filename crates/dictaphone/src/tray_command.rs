use crate::TrayIconState;

/// Commands sent from the async runtime to the main UI thread.
///
/// The main thread owns `TrayManager` (because `TrayIcon` is `!Send`), so
/// tray updates and process exit flow through the event loop proxy as this
/// enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayCommand {
    /// Show a new session state.
    SetState(TrayIconState),
    /// Exit the event loop.
    Shutdown,
}
