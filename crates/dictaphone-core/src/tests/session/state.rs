use super::mocks::MockConnection;
use crate::{
    SessionPhase, Watchdog,
    session::state::SessionState,
};

use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

/// WHAT: Idle has no session, no deadline and nothing to release
/// WHY: Idle must never hold a connection
#[test]
fn given_idle_when_releasing_then_nothing_returned() {
    // Given: Idle state
    let mut state = SessionState::Idle;

    // When/Then: Nothing to release and no identity
    assert_eq!(state.session_id(), None);
    assert_eq!(state.deadline(), None);
    assert!(state.release().is_none());
}

/// WHAT: Recording has a session but no deadline
/// WHY: The deadline only exists once the stop frame has been sent
#[tokio::test(start_paused = true)]
async fn given_recording_when_inspecting_then_current_without_deadline() {
    // Given: A recording state
    let session_id = Uuid::new_v4();
    let state = SessionState::Recording {
        session_id,
        started_at: Instant::now(),
        connection: MockConnection::boxed(session_id),
    };

    // Then: It is current for its own id only
    assert_eq!(state.phase(), SessionPhase::Recording);
    assert!(state.is_current(session_id));
    assert!(!state.is_current(Uuid::new_v4()));
    assert_eq!(state.deadline(), None);
}

/// WHAT: Releasing AwaitingResponse hands back connection and watchdog, leaving Idle
/// WHY: The controller must disarm and disconnect exactly what it owned
#[tokio::test(start_paused = true)]
async fn given_awaiting_when_releasing_then_idle_with_watchdog_returned() {
    // Given: An awaiting state with an armed watchdog
    let session_id = Uuid::new_v4();
    let watchdog = Watchdog::arm(Duration::from_secs(10), async {});
    let deadline = watchdog.deadline();
    let mut state = SessionState::AwaitingResponse {
        session_id,
        started_at: Instant::now(),
        connection: MockConnection::boxed(session_id),
        watchdog,
    };
    assert_eq!(state.deadline(), Some(deadline));

    // When: Releasing
    let released = state.release();

    // Then: State is Idle and the released parts match
    assert_eq!(state.phase(), SessionPhase::Idle);
    let released = released.as_ref();
    assert_eq!(released.map(|r| r.session_id), Some(session_id));
    assert_eq!(
        released.map(|r| r.phase),
        Some(SessionPhase::AwaitingResponse)
    );
    assert!(released.is_some_and(|r| r.watchdog.is_some()));
}

/// WHAT: Only the live awaiting session accepts a watchdog fire
/// WHY: A fire queued for an ended or newer session must be a no-op
#[tokio::test(start_paused = true)]
async fn given_states_when_checking_watchdog_target_then_only_current_awaiting_accepts() {
    // Given: An awaiting session
    let session_id = Uuid::new_v4();
    let mut state = SessionState::AwaitingResponse {
        session_id,
        started_at: Instant::now(),
        connection: MockConnection::boxed(session_id),
        watchdog: Watchdog::arm(Duration::from_secs(10), async {}),
    };

    // Then: Accepts its own id only
    assert!(state.is_awaiting(session_id));
    assert!(!state.is_awaiting(Uuid::new_v4()));

    // When: Released, then a newer session starts recording
    let _released = state.release();
    assert!(!state.is_awaiting(session_id));
    let next_id = Uuid::new_v4();
    state = SessionState::Recording {
        session_id: next_id,
        started_at: Instant::now(),
        connection: MockConnection::boxed(next_id),
    };

    // Then: Neither the old nor the recording id accepts a fire
    assert!(!state.is_awaiting(session_id));
    assert!(!state.is_awaiting(next_id));
}
