mod mocks;
mod state;
mod watchdog;
