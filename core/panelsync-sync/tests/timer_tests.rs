use panelsync_sync::timer::{DelayTimer, Firing};
use std::time::Duration;
use tokio::time::Instant;

const DELAY: Duration = Duration::from_secs(2);

// ── Arming ──────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn new_timer_is_disarmed() {
    let timer = DelayTimer::new(DELAY);
    assert!(!timer.is_armed());
    assert_eq!(timer.delay(), DELAY);
    assert_eq!(timer.deadline(), None);
    assert_eq!(timer.windows_opened(), 0);
}

#[tokio::test(start_paused = true)]
async fn start_sets_deadline() {
    let mut timer = DelayTimer::new(DELAY);
    let before = Instant::now();
    timer.start();
    assert!(timer.is_armed());
    assert_eq!(timer.deadline(), Some(before + DELAY));
}

#[tokio::test(start_paused = true)]
async fn stop_without_window_is_noop() {
    let mut timer = DelayTimer::new(DELAY);
    timer.stop();
    timer.pause();
    assert!(!timer.is_armed());
    assert_eq!(timer.windows_cancelled(), 0);
}

#[tokio::test(start_paused = true)]
async fn restart_cancels_exactly_one_window() {
    let mut timer = DelayTimer::new(DELAY);
    timer.start();
    timer.start();
    assert_eq!(timer.windows_opened(), 2);
    assert_eq!(timer.windows_cancelled(), 1);

    timer.reset();
    assert_eq!(timer.windows_opened(), 3);
    assert_eq!(timer.windows_cancelled(), 2);
}

#[tokio::test(start_paused = true)]
async fn resume_rearms_and_reports_firing() {
    let mut timer = DelayTimer::new(DELAY);
    assert_eq!(timer.resume(false), Firing::Deferred);
    assert!(timer.is_armed());
    assert_eq!(timer.resume(true), Firing::Immediate);
    assert!(timer.is_armed());
    assert_eq!(timer.windows_cancelled(), 1);
}

// ── Expiry ──────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn expires_once_after_delay() {
    let mut timer = DelayTimer::new(DELAY);
    let started = Instant::now();
    timer.start();
    timer.expired().await;

    assert!(Instant::now() - started >= DELAY);
    assert!(!timer.is_armed());
    assert_eq!(timer.windows_fired(), 1);
}

#[tokio::test(start_paused = true)]
async fn restart_pushes_deadline_back() {
    let mut timer = DelayTimer::new(DELAY);
    let started = Instant::now();
    timer.start();
    tokio::time::advance(Duration::from_millis(1500)).await;
    timer.start();
    timer.expired().await;

    assert!(Instant::now() - started >= Duration::from_millis(3500));
    assert_eq!(timer.windows_fired(), 1);
}

#[tokio::test(start_paused = true)]
async fn disarmed_timer_never_expires() {
    let mut timer = DelayTimer::new(DELAY);
    timer.start();
    timer.stop();
    let outcome = tokio::time::timeout(Duration::from_secs(60), timer.expired()).await;
    assert!(outcome.is_err());
    assert_eq!(timer.windows_fired(), 0);
}

#[tokio::test(start_paused = true)]
async fn dropped_wait_keeps_deadline() {
    let mut timer = DelayTimer::new(DELAY);
    timer.start();
    let outcome = tokio::time::timeout(Duration::from_millis(100), timer.expired()).await;
    assert!(outcome.is_err());
    assert!(timer.is_armed());

    timer.expired().await;
    assert_eq!(timer.windows_fired(), 1);
}
