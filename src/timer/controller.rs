use std::{sync::Arc, time::Duration};

use log::{debug, info, warn};
use serde::Serialize;
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};

use crate::{
    clock::{Clock, SystemClock},
    error::EngineError,
    events::{EngineEvent, EventSink, SoundCue, SoundHook},
    metrics::MetricsLedger,
    models::{FinalizedSession, FocusTask},
    reminder::PauseReminder,
    timer::state::{
        sanitize_minutes, SessionStatus, TickOutcome, TimerSession, MIN_EXPECTED_SECONDS,
    },
};

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub session: TimerSession,
    pub remaining_seconds: u64,
}

impl TimerSnapshot {
    fn of(session: &TimerSession) -> Self {
        Self {
            remaining_seconds: session.remaining_seconds,
            session: session.clone(),
        }
    }
}

struct EngineState {
    session: Option<TimerSession>,
    ledger: MetricsLedger,
}

/// Owns the active session and mediates every transition. The ticker task it
/// spawns is the only recurring work; it is aborted on each exit from
/// Running and stops itself if it ever observes a non-Running status.
#[derive(Clone)]
pub struct SessionController {
    state: Arc<Mutex<EngineState>>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    reminder: Arc<Mutex<PauseReminder>>,
    sink: Arc<dyn EventSink>,
    sound: Option<SoundHook>,
    clock: Arc<dyn Clock>,
    tick_interval: Duration,
}

impl SessionController {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self::with_clock(sink, Arc::new(SystemClock))
    }

    pub fn with_clock(sink: Arc<dyn EventSink>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(EngineState {
                session: None,
                ledger: MetricsLedger::new(),
            })),
            ticker: Arc::new(Mutex::new(None)),
            reminder: Arc::new(Mutex::new(PauseReminder::new())),
            sink,
            sound: None,
            clock,
            tick_interval: Duration::from_secs(1),
        }
    }

    /// Installs the fire-and-forget audio callback invoked on natural expiry
    /// and on the paused-state reminder.
    pub fn with_sound_hook(mut self, sound: SoundHook) -> Self {
        self.sound = Some(sound);
        self
    }

    pub fn with_reminder_delay(self, delay: Duration) -> Self {
        Self {
            reminder: Arc::new(Mutex::new(PauseReminder::with_delay(delay))),
            ..self
        }
    }

    /// Creates a fresh Idle session for `task`, discarding any prior session
    /// and its timers.
    pub async fn select_task(&self, task: FocusTask) -> TimerSnapshot {
        self.cancel_ticker().await;
        self.reminder.lock().await.disarm();

        let mut state = self.state.lock().await;
        if let Some(prev) = &state.session {
            if prev.status.is_active() {
                info!("discarding in-flight session {} for a new task", prev.id);
            }
        }
        state.ledger.reset();

        if task.expected_duration_seconds < MIN_EXPECTED_SECONDS {
            warn!(
                "task '{}' asked for {}s; using the one-minute floor",
                task.name, task.expected_duration_seconds
            );
        }
        let session = TimerSession::new(task.name, task.expected_duration_seconds);
        info!(
            "selected task '{}' as session {} ({}s)",
            session.task_name, session.id, session.expected_duration_seconds
        );
        let snapshot = TimerSnapshot::of(&session);
        state.session = Some(session);
        snapshot
    }

    /// Read-only view of the current session.
    pub async fn snapshot(&self) -> Result<TimerSnapshot, EngineError> {
        let state = self.state.lock().await;
        let session = state.session.as_ref().ok_or(EngineError::NoActiveSession)?;
        Ok(TimerSnapshot::of(session))
    }

    pub async fn start(&self) -> Result<TimerSnapshot, EngineError> {
        let snapshot = {
            let mut state = self.state.lock().await;
            let now = self.clock.now();
            let session = state.session.as_mut().ok_or(EngineError::NoActiveSession)?;
            if !session.begin(now) {
                debug!("start ignored while {:?}", session.status);
                return Ok(TimerSnapshot::of(session));
            }
            info!(
                "session {} running, {}s on the clock",
                session.id, session.remaining_seconds
            );
            TimerSnapshot::of(session)
        };

        self.spawn_ticker().await;
        self.sink.emit(EngineEvent::Started {
            remaining_seconds: snapshot.remaining_seconds,
        });
        Ok(snapshot)
    }

    pub async fn pause(&self) -> Result<TimerSnapshot, EngineError> {
        let snapshot = {
            let mut state = self.state.lock().await;
            let now = self.clock.now();
            let session = state.session.as_mut().ok_or(EngineError::NoActiveSession)?;
            if !session.pause(now) {
                debug!("pause ignored while {:?}", session.status);
                return Ok(TimerSnapshot::of(session));
            }
            info!(
                "session {} paused ({} pauses so far)",
                session.id, session.pause_count
            );
            TimerSnapshot::of(session)
        };

        self.cancel_ticker().await;
        if let Some(sound) = &self.sound {
            self.reminder.lock().await.arm(sound.clone());
        }
        self.sink.emit(EngineEvent::Paused {
            remaining_seconds: snapshot.remaining_seconds,
        });
        Ok(snapshot)
    }

    pub async fn resume(&self) -> Result<TimerSnapshot, EngineError> {
        let snapshot = {
            let mut state = self.state.lock().await;
            let now = self.clock.now();
            let session = state.session.as_mut().ok_or(EngineError::NoActiveSession)?;
            if !session.resume(now) {
                debug!("resume ignored while {:?}", session.status);
                return Ok(TimerSnapshot::of(session));
            }
            info!(
                "session {} resumed, {}s paused in total",
                session.id, session.total_paused_seconds
            );
            TimerSnapshot::of(session)
        };

        self.reminder.lock().await.disarm();
        self.spawn_ticker().await;
        self.sink.emit(EngineEvent::Resumed {
            remaining_seconds: snapshot.remaining_seconds,
        });
        Ok(snapshot)
    }

    /// Pause while Running, resume while Paused, otherwise a no-op.
    pub async fn toggle(&self) -> Result<TimerSnapshot, EngineError> {
        let status = {
            let state = self.state.lock().await;
            let session = state.session.as_ref().ok_or(EngineError::NoActiveSession)?;
            session.status
        };
        match status {
            SessionStatus::Running => self.pause().await,
            SessionStatus::Paused => self.resume().await,
            _ => {
                debug!("toggle ignored while {:?}", status);
                self.snapshot().await
            }
        }
    }

    /// Retargets the session duration. Minutes are sanitized to [1, 60];
    /// non-numeric input falls back to the current duration.
    pub async fn set_minutes(&self, minutes: f64) -> Result<TimerSnapshot, EngineError> {
        let (snapshot, applied) = {
            let mut state = self.state.lock().await;
            let session = state.session.as_mut().ok_or(EngineError::NoActiveSession)?;
            let fallback = (session.expected_duration_seconds / 60).max(1) as u32;
            let applied = sanitize_minutes(minutes, fallback);
            if !session.set_minutes(applied) {
                debug!("setMinutes ignored while running");
                return Ok(TimerSnapshot::of(session));
            }
            info!("session {} retargeted to {} minutes", session.id, applied);
            (TimerSnapshot::of(session), applied)
        };

        self.sink.emit(EngineEvent::DurationChanged { minutes: applied });
        Ok(snapshot)
    }

    /// Extends a Running, Paused, or expiry-pending session. From
    /// AwaitingConfirmation the countdown picks back up.
    pub async fn add_time(&self, minutes: f64) -> Result<TimerSnapshot, EngineError> {
        let (snapshot, resumed_from_expiry) = {
            let mut state = self.state.lock().await;
            let session = state.session.as_mut().ok_or(EngineError::NoActiveSession)?;
            let fallback = (session.expected_duration_seconds / 60).max(1) as u32;
            let applied = sanitize_minutes(minutes, fallback);
            let was_awaiting = session.status == SessionStatus::AwaitingConfirmation;
            if !session.extend_by(applied) {
                debug!("addTime ignored while {:?}", session.status);
                return Ok(TimerSnapshot::of(session));
            }
            info!(
                "session {} extended by {} minutes ({}s remaining)",
                session.id, applied, session.remaining_seconds
            );
            (TimerSnapshot::of(session), was_awaiting)
        };

        if resumed_from_expiry {
            self.spawn_ticker().await;
            self.sink.emit(EngineEvent::Resumed {
                remaining_seconds: snapshot.remaining_seconds,
            });
        }
        Ok(snapshot)
    }

    /// Finalizes the session immediately from Running, Paused, or
    /// AwaitingConfirmation, skipping whatever countdown remains. Calling it
    /// again on a Completed session returns the retained result.
    pub async fn complete_now(&self) -> Result<FinalizedSession, EngineError> {
        let finalized = {
            let mut state = self.state.lock().await;
            let now = self.clock.now();
            let EngineState { session, ledger } = &mut *state;
            let session = session.as_mut().ok_or(EngineError::NoActiveSession)?;

            match session.status {
                SessionStatus::Idle => {
                    warn!("completeNow on session {} that never ran", session.id);
                    return Err(EngineError::NothingToFinalize);
                }
                SessionStatus::Completed => {
                    debug!(
                        "completeNow on finished session {}; returning retained metrics",
                        session.id
                    );
                    return Ok(FinalizedSession::from_session(session, ledger.last_snapshot()));
                }
                _ => {}
            }

            let metrics = ledger.finalize(session, now);
            session.finalize(now);
            info!(
                "session {} completed: {}s net effective, {:.0}% efficiency, {}",
                session.id,
                metrics.net_effective_seconds,
                metrics.efficiency_ratio,
                metrics.completion.as_str()
            );
            FinalizedSession::from_session(session, metrics)
        };

        self.cancel_ticker().await;
        self.reminder.lock().await.disarm();
        self.sink.emit(EngineEvent::Completed {
            session: finalized.clone(),
        });
        Ok(finalized)
    }

    /// Completed -> Idle, keeping the task and target duration for another
    /// run.
    pub async fn reset(&self) -> Result<TimerSnapshot, EngineError> {
        let snapshot = {
            let mut state = self.state.lock().await;
            let EngineState { session, ledger } = &mut *state;
            let session = session.as_mut().ok_or(EngineError::NoActiveSession)?;
            if !session.reset_for_new_run() {
                debug!("reset ignored while {:?}", session.status);
                return Ok(TimerSnapshot::of(session));
            }
            ledger.reset();
            info!(
                "session reset; {} is idle again at {}s",
                session.id, session.remaining_seconds
            );
            TimerSnapshot::of(session)
        };

        self.cancel_ticker().await;
        self.reminder.lock().await.disarm();
        Ok(snapshot)
    }

    /// Incidental "liked a quote" counter; no effect on timing.
    pub async fn record_quote_favorite(&self) -> Result<u32, EngineError> {
        let mut state = self.state.lock().await;
        let session = state.session.as_mut().ok_or(EngineError::NoActiveSession)?;
        let count = session.record_quote_favorite();
        debug!("session {} favorite quotes: {}", session.id, count);
        Ok(count)
    }

    /// Explicit teardown: stops the ticker and the reminder. Idempotent.
    pub async fn dispose(&self) {
        self.cancel_ticker().await;
        self.reminder.lock().await.disarm();
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let state = self.state.clone();
        let sink = self.sink.clone();
        let sound = self.sound.clone();
        let tick_interval = self.tick_interval;

        let handle = tokio::spawn(async move {
            // First tick lands one full interval after (re)start.
            let mut interval = time::interval_at(time::Instant::now() + tick_interval, tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;

                let (outcome, remaining) = {
                    let mut guard = state.lock().await;
                    let Some(session) = guard.session.as_mut() else {
                        break;
                    };
                    let outcome = session.tick();
                    (outcome, session.remaining_seconds)
                };

                match outcome {
                    TickOutcome::Ticking => {
                        sink.emit(EngineEvent::Tick {
                            remaining_seconds: remaining,
                        });
                    }
                    TickOutcome::Expired => {
                        info!("countdown expired; awaiting extend-or-complete confirmation");
                        sink.emit(EngineEvent::Tick {
                            remaining_seconds: remaining,
                        });
                        if let Some(sound) = &sound {
                            sound(SoundCue::SessionExpired);
                        }
                        sink.emit(EngineEvent::AwaitingConfirmation {
                            remaining_seconds: remaining,
                        });
                        break;
                    }
                    TickOutcome::Ignored => break,
                }
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }
}
