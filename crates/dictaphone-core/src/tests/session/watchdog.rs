use crate::Watchdog;

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use tokio::time::sleep;

fn counting_watchdog(duration: Duration) -> (Watchdog, Arc<AtomicUsize>) {
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    let watchdog = Watchdog::arm(duration, async move {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    (watchdog, fired)
}

/// WHAT: An armed watchdog fires once after its duration
/// WHY: This is what guarantees the session leaves AwaitingResponse
#[tokio::test(start_paused = true)]
async fn given_armed_watchdog_when_duration_elapses_then_fires_once() {
    // Given: A 10s watchdog
    let (watchdog, fired) = counting_watchdog(Duration::from_secs(10));

    // When: Just before and well after expiry
    sleep(Duration::from_millis(9_999)).await;
    let before = fired.load(Ordering::SeqCst);
    sleep(Duration::from_secs(5)).await;

    // Then: Fired exactly once, after the deadline
    assert_eq!(before, 0);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert!(watchdog.has_fired());
}

/// WHAT: Disarming before expiry prevents firing
/// WHY: A delivered transcript must not be followed by a timeout
#[tokio::test(start_paused = true)]
async fn given_armed_watchdog_when_disarmed_early_then_never_fires() {
    // Given: A 10s watchdog
    let (watchdog, fired) = counting_watchdog(Duration::from_secs(10));

    // When: Disarming after 3s
    sleep(Duration::from_secs(3)).await;
    let prevented = watchdog.disarm();
    sleep(Duration::from_secs(30)).await;

    // Then: Disarm reports success and nothing fired
    assert!(prevented);
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

/// WHAT: Dropping the watchdog cancels it
/// WHY: A released session can never leave a live timer behind
#[tokio::test(start_paused = true)]
async fn given_armed_watchdog_when_dropped_then_never_fires() {
    // Given: A 1s watchdog
    let (watchdog, fired) = counting_watchdog(Duration::from_secs(1));

    // When: Dropping it
    drop(watchdog);
    sleep(Duration::from_secs(5)).await;

    // Then: Nothing fired
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

/// WHAT: Disarming after expiry reports it was too late
/// WHY: The controller uses this to tell a timeout from a normal finish
#[tokio::test(start_paused = true)]
async fn given_fired_watchdog_when_disarming_then_reports_false() {
    // Given: A watchdog that already fired
    let (watchdog, _fired) = counting_watchdog(Duration::from_secs(1));
    sleep(Duration::from_secs(2)).await;

    // When/Then: Disarm returns false
    assert!(!watchdog.disarm());
}

/// WHAT: Deadline is arm time plus duration
/// WHY: Observers show a countdown from the published deadline
#[tokio::test(start_paused = true)]
async fn given_watchdog_when_reading_deadline_then_arm_time_plus_duration() {
    // Given: The current instant
    let now = tokio::time::Instant::now();

    // When: Arming for 10s
    let (watchdog, _fired) = counting_watchdog(Duration::from_secs(10));

    // Then: Deadline is exactly 10s out
    assert_eq!(watchdog.deadline(), now + Duration::from_secs(10));
}
