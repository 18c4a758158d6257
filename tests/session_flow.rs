use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;

use deepfocus::{
    Clock, CompletionStatus, EngineError, EngineEvent, EventSink, FocusTask, ManualClock,
    SessionController, SessionStatus, SoundCue, SoundHook,
};

#[derive(Default)]
struct EventLog {
    events: Mutex<Vec<EngineEvent>>,
}

impl EventSink for EventLog {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl EventLog {
    fn tick_count(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, EngineEvent::Tick { .. }))
            .count()
    }

    fn completed_count(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, EngineEvent::Completed { .. }))
            .count()
    }

    fn awaiting_count(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, EngineEvent::AwaitingConfirmation { .. }))
            .count()
    }

    fn last_tick_remaining(&self) -> Option<u64> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|e| match e {
                EngineEvent::Tick { remaining_seconds } => Some(*remaining_seconds),
                _ => None,
            })
    }
}

#[derive(Default)]
struct CueLog {
    cues: Mutex<Vec<SoundCue>>,
}

impl CueLog {
    fn hook(log: &Arc<Self>) -> SoundHook {
        let log = Arc::clone(log);
        Arc::new(move |cue| log.cues.lock().unwrap().push(cue))
    }

    fn count_of(&self, cue: SoundCue) -> usize {
        self.cues.lock().unwrap().iter().filter(|c| **c == cue).count()
    }
}

fn engine() -> (SessionController, Arc<EventLog>, Arc<ManualClock>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let log = Arc::new(EventLog::default());
    let clock = Arc::new(ManualClock::starting_at(
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
    ));
    let controller = SessionController::with_clock(log.clone(), clock.clone());
    (controller, log, clock)
}

/// Lets the paused tokio clock auto-advance through `secs` worth of ticker
/// deadlines, with a few milliseconds of slack so the final tick is
/// processed before we assert.
async fn run_for_secs(secs: u64) {
    tokio::time::sleep(Duration::from_millis(secs * 1000 + 5)).await;
}

#[tokio::test(start_paused = true)]
async fn countdown_ticks_once_per_second() {
    let (controller, log, _clock) = engine();
    controller.select_task(FocusTask::new("write draft", 300)).await;
    controller.start().await.unwrap();

    run_for_secs(150).await;

    let snapshot = controller.snapshot().await.unwrap();
    assert_eq!(snapshot.session.status, SessionStatus::Running);
    assert_eq!(snapshot.remaining_seconds, 150);
    assert_eq!(log.tick_count(), 150);
    assert_eq!(log.last_tick_remaining(), Some(150));
}

#[tokio::test(start_paused = true)]
async fn natural_expiry_waits_for_confirmation() {
    let (controller, log, _clock) = engine();
    let cues = Arc::new(CueLog::default());
    let controller = controller.with_sound_hook(CueLog::hook(&cues));

    controller.select_task(FocusTask::new("stretch", 120)).await;
    controller.start().await.unwrap();

    run_for_secs(125).await;

    let snapshot = controller.snapshot().await.unwrap();
    assert_eq!(snapshot.session.status, SessionStatus::AwaitingConfirmation);
    assert_eq!(snapshot.remaining_seconds, 0);
    assert_eq!(log.tick_count(), 120);
    assert_eq!(log.awaiting_count(), 1);
    assert_eq!(log.completed_count(), 0);
    assert_eq!(cues.count_of(SoundCue::SessionExpired), 1);

    // Clock teardown: nothing ticks after leaving Running.
    run_for_secs(30).await;
    assert_eq!(log.tick_count(), 120);
}

#[tokio::test(start_paused = true)]
async fn early_completion_derives_metrics() {
    let (controller, log, clock) = engine();
    controller.select_task(FocusTask::new("inbox zero", 300)).await;
    controller.start().await.unwrap();

    run_for_secs(150).await;
    clock.advance_secs(150);

    let finalized = controller.complete_now().await.unwrap();
    assert_eq!(finalized.status, SessionStatus::Completed);
    assert_eq!(finalized.metrics.actual_elapsed_seconds, 150);
    assert_eq!(finalized.metrics.final_paused_seconds, 0);
    assert_eq!(finalized.metrics.net_effective_seconds, 150);
    assert_eq!(finalized.metrics.completion, CompletionStatus::CompletedEarly);
    assert_eq!(finalized.metrics.efficiency_ratio, 100.0);
    assert_eq!(log.completed_count(), 1);

    // No ticks after finalization either.
    let ticks = log.tick_count();
    run_for_secs(10).await;
    assert_eq!(log.tick_count(), ticks);
}

#[tokio::test(start_paused = true)]
async fn extending_past_expiry_completes_late() {
    let (controller, log, clock) = engine();
    controller.select_task(FocusTask::new("refactor", 300)).await;
    controller.start().await.unwrap();

    run_for_secs(300).await;
    clock.advance_secs(300);
    assert_eq!(log.awaiting_count(), 1);

    // Extend from the confirmation step; ticking resumes.
    let snapshot = controller.add_time(5.0).await.unwrap();
    assert_eq!(snapshot.session.status, SessionStatus::Running);
    assert_eq!(snapshot.remaining_seconds, 300);
    assert_eq!(snapshot.session.extension_seconds, 300);

    run_for_secs(150).await;
    clock.advance_secs(150);

    let finalized = controller.complete_now().await.unwrap();
    assert_eq!(finalized.metrics.actual_elapsed_seconds, 450);
    assert_eq!(finalized.metrics.net_effective_seconds, 750);
    assert_eq!(finalized.metrics.completion, CompletionStatus::CompletedLate);
}

#[tokio::test(start_paused = true)]
async fn paused_time_is_excluded_from_net_effective() {
    let (controller, log, clock) = engine();
    controller.select_task(FocusTask::new("read paper", 300)).await;
    controller.start().await.unwrap();

    run_for_secs(60).await;
    clock.advance_secs(60);
    controller.pause().await.unwrap();
    let ticks_at_pause = log.tick_count();

    // Half a minute passes on the wall clock, none of it ticking.
    run_for_secs(30).await;
    clock.advance_secs(30);
    assert_eq!(log.tick_count(), ticks_at_pause);

    controller.resume().await.unwrap();
    run_for_secs(60).await;
    clock.advance_secs(60);

    let finalized = controller.complete_now().await.unwrap();
    assert_eq!(finalized.metrics.actual_elapsed_seconds, 150);
    assert_eq!(finalized.metrics.final_paused_seconds, 30);
    assert_eq!(finalized.metrics.net_effective_seconds, 120);
    assert_eq!(finalized.metrics.pause_count, 1);
    assert_eq!(log.tick_count(), 120);
}

#[tokio::test(start_paused = true)]
async fn add_time_extends_running_and_paused_sessions() {
    let (controller, _log, _clock) = engine();
    controller.select_task(FocusTask::new("plan sprint", 300)).await;
    controller.start().await.unwrap();

    let snapshot = controller.add_time(5.0).await.unwrap();
    assert_eq!(snapshot.remaining_seconds, 600);
    assert_eq!(snapshot.session.extension_seconds, 300);

    controller.pause().await.unwrap();
    let snapshot = controller.add_time(5.0).await.unwrap();
    assert_eq!(snapshot.remaining_seconds, 900);
    assert_eq!(snapshot.session.extension_seconds, 600);
    assert_eq!(snapshot.session.status, SessionStatus::Paused);
    assert_eq!(snapshot.session.pause_count, 1);
}

#[tokio::test(start_paused = true)]
async fn set_minutes_sanitizes_input() {
    let (controller, log, _clock) = engine();
    controller.select_task(FocusTask::new("journal", 300)).await;

    let snapshot = controller.set_minutes(45.0).await.unwrap();
    assert_eq!(snapshot.session.expected_duration_seconds, 45 * 60);
    assert_eq!(snapshot.remaining_seconds, 45 * 60);

    let snapshot = controller.set_minutes(99.0).await.unwrap();
    assert_eq!(snapshot.session.expected_duration_seconds, 60 * 60);

    // Non-numeric input keeps the current duration.
    let snapshot = controller.set_minutes(f64::NAN).await.unwrap();
    assert_eq!(snapshot.session.expected_duration_seconds, 60 * 60);

    let changes: Vec<u32> = log
        .events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|e| match e {
            EngineEvent::DurationChanged { minutes } => Some(*minutes),
            _ => None,
        })
        .collect();
    assert_eq!(changes, vec![45, 60, 60]);

    // Rejected while Running: the target stays put.
    controller.start().await.unwrap();
    let snapshot = controller.set_minutes(10.0).await.unwrap();
    assert_eq!(snapshot.session.expected_duration_seconds, 60 * 60);
}

#[tokio::test(start_paused = true)]
async fn reset_produces_a_fresh_idle_session() {
    let (controller, _log, clock) = engine();
    controller.select_task(FocusTask::new("email", 120)).await;
    controller.start().await.unwrap();

    run_for_secs(5).await;
    clock.advance_secs(5);
    controller.complete_now().await.unwrap();

    let snapshot = controller.reset().await.unwrap();
    assert_eq!(snapshot.session.status, SessionStatus::Idle);
    assert_eq!(snapshot.remaining_seconds, 120);
    assert_eq!(snapshot.session.pause_count, 0);
    assert_eq!(snapshot.session.total_paused_seconds, 0);
    assert_eq!(snapshot.session.extension_seconds, 0);
    assert_eq!(snapshot.session.started_at, None);

    clock.advance_secs(100);
    let snapshot = controller.start().await.unwrap();
    assert_eq!(snapshot.session.status, SessionStatus::Running);
    assert_eq!(snapshot.session.started_at, Some(clock.now()));
}

#[tokio::test(start_paused = true)]
async fn toggle_flips_between_running_and_paused() {
    let (controller, _log, _clock) = engine();
    controller.select_task(FocusTask::new("sketch", 300)).await;
    controller.start().await.unwrap();

    let snapshot = controller.toggle().await.unwrap();
    assert_eq!(snapshot.session.status, SessionStatus::Paused);

    let snapshot = controller.toggle().await.unwrap();
    assert_eq!(snapshot.session.status, SessionStatus::Running);
}

#[tokio::test(start_paused = true)]
async fn commands_without_a_session_are_rejected() {
    let (controller, _log, _clock) = engine();
    assert_eq!(controller.start().await.unwrap_err(), EngineError::NoActiveSession);
    assert_eq!(controller.pause().await.unwrap_err(), EngineError::NoActiveSession);
    assert_eq!(
        controller.add_time(5.0).await.unwrap_err(),
        EngineError::NoActiveSession
    );
    assert_eq!(
        controller.complete_now().await.unwrap_err(),
        EngineError::NoActiveSession
    );
    assert_eq!(
        controller.snapshot().await.unwrap_err(),
        EngineError::NoActiveSession
    );
}

#[tokio::test(start_paused = true)]
async fn completing_an_idle_session_has_nothing_to_finalize() {
    let (controller, log, _clock) = engine();
    controller.select_task(FocusTask::new("warmup", 300)).await;
    assert_eq!(
        controller.complete_now().await.unwrap_err(),
        EngineError::NothingToFinalize
    );
    assert_eq!(log.completed_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn quote_favorites_ride_along_without_touching_timing() {
    let (controller, _log, clock) = engine();
    controller.select_task(FocusTask::new("focus", 300)).await;
    controller.start().await.unwrap();

    assert_eq!(controller.record_quote_favorite().await.unwrap(), 1);
    assert_eq!(controller.record_quote_favorite().await.unwrap(), 2);

    run_for_secs(30).await;
    clock.advance_secs(30);
    let finalized = controller.complete_now().await.unwrap();
    assert_eq!(finalized.favorite_quote_count, 2);
    assert_eq!(finalized.metrics.net_effective_seconds, 30);
}

#[tokio::test(start_paused = true)]
async fn pause_reminder_fires_once_and_cancels_on_resume() {
    let (controller, _log, clock) = engine();
    let cues = Arc::new(CueLog::default());
    let controller = controller.with_sound_hook(CueLog::hook(&cues));

    controller.select_task(FocusTask::new("thesis", 3000)).await;
    controller.start().await.unwrap();

    // A short pause resolved before the reminder delay stays silent.
    run_for_secs(10).await;
    clock.advance_secs(10);
    controller.pause().await.unwrap();
    run_for_secs(60).await;
    clock.advance_secs(60);
    controller.resume().await.unwrap();
    run_for_secs(310).await;
    clock.advance_secs(310);
    assert_eq!(cues.count_of(SoundCue::PauseReminder), 0);

    // Left paused past five minutes, the nudge fires exactly once.
    controller.pause().await.unwrap();
    run_for_secs(310).await;
    clock.advance_secs(310);
    assert_eq!(cues.count_of(SoundCue::PauseReminder), 1);

    run_for_secs(310).await;
    assert_eq!(cues.count_of(SoundCue::PauseReminder), 1);
}
