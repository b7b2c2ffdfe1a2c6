mod command;
mod controller;
mod phase;
pub(crate) mod state;
mod watchdog;

pub use {
    command::SessionCommand,
    controller::{INJECTION_TIMEOUT, RESPONSE_TIMEOUT, SessionController, SessionDeps, SessionHandle},
    phase::{SessionOutcome, SessionPhase, SessionSnapshot},
    watchdog::Watchdog,
};
