use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MIN_SESSION_MINUTES: u32 = 1;
pub const MAX_SESSION_MINUTES: u32 = 60;
pub const DEFAULT_SESSION_MINUTES: u32 = 25;

/// Sessions shorter than a minute are not meaningful focus work.
pub const MIN_EXPECTED_SECONDS: u64 = 60;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Idle,
    Running,
    Paused,
    AwaitingConfirmation,
    Completed,
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Idle
    }
}

impl SessionStatus {
    /// Active means the session has work in flight and can still be
    /// extended or finalized.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            SessionStatus::Running | SessionStatus::Paused | SessionStatus::AwaitingConfirmation
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still counting down.
    Ticking,
    /// The countdown hit zero; the session now awaits confirmation.
    Expired,
    /// Tick delivered outside Running; nothing changed.
    Ignored,
}

/// The authoritative session record. All mutation goes through the transition
/// methods below; wall-clock instants are passed in by the caller so the
/// record itself never reads the system clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSession {
    pub id: String,
    pub task_name: String,
    pub status: SessionStatus,
    pub expected_duration_seconds: u64,
    pub remaining_seconds: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub pause_count: u32,
    pub last_pause_at: Option<DateTime<Utc>>,
    pub total_paused_seconds: u64,
    pub extension_seconds: u64,
    pub favorite_quote_count: u32,
}

impl TimerSession {
    pub fn new(task_name: String, expected_duration_seconds: u64) -> Self {
        let expected = expected_duration_seconds.max(MIN_EXPECTED_SECONDS);
        Self {
            id: Uuid::new_v4().to_string(),
            task_name,
            status: SessionStatus::Idle,
            expected_duration_seconds: expected,
            remaining_seconds: expected,
            started_at: None,
            ended_at: None,
            pause_count: 0,
            last_pause_at: None,
            total_paused_seconds: 0,
            extension_seconds: 0,
            favorite_quote_count: 0,
        }
    }

    /// Idle -> Running. `started_at` is set once and survives every later
    /// pause/resume cycle.
    pub fn begin(&mut self, now: DateTime<Utc>) -> bool {
        if self.status != SessionStatus::Idle {
            return false;
        }
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        self.last_pause_at = None;
        self.status = SessionStatus::Running;
        true
    }

    /// One second of countdown. Only meaningful while Running; the ticker
    /// stops itself on any other status.
    pub fn tick(&mut self) -> TickOutcome {
        if self.status != SessionStatus::Running {
            return TickOutcome::Ignored;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.status = SessionStatus::AwaitingConfirmation;
            TickOutcome::Expired
        } else {
            TickOutcome::Ticking
        }
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> bool {
        if self.status != SessionStatus::Running {
            return false;
        }
        self.last_pause_at = Some(now);
        self.pause_count += 1;
        self.status = SessionStatus::Paused;
        true
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> bool {
        if self.status != SessionStatus::Paused {
            return false;
        }
        if let Some(paused_at) = self.last_pause_at.take() {
            self.total_paused_seconds += (now - paused_at).num_seconds().max(0) as u64;
        }
        self.status = SessionStatus::Running;
        true
    }

    /// Adds whole minutes to both the remaining countdown and the extension
    /// tally. Pause accounting and `started_at` are untouched. From
    /// AwaitingConfirmation the session returns to Running.
    pub fn extend_by(&mut self, minutes: u32) -> bool {
        if !self.status.is_active() {
            return false;
        }
        let seconds = u64::from(minutes) * 60;
        self.remaining_seconds += seconds;
        self.extension_seconds += seconds;
        if self.status == SessionStatus::AwaitingConfirmation {
            self.status = SessionStatus::Running;
        }
        true
    }

    /// Retargets the session duration. Rejected while Running; the countdown
    /// is reset to the new target everywhere else.
    pub fn set_minutes(&mut self, minutes: u32) -> bool {
        if self.status == SessionStatus::Running {
            return false;
        }
        let seconds = u64::from(minutes) * 60;
        self.expected_duration_seconds = seconds;
        self.remaining_seconds = seconds;
        true
    }

    /// Marks the session finished. Metrics are derived separately, before
    /// this call, so the ledger can still see an open pause interval.
    pub fn finalize(&mut self, now: DateTime<Utc>) {
        self.status = SessionStatus::Completed;
        self.ended_at = Some(now);
    }

    /// Completed -> Idle with fresh counters and a fresh id; the expected
    /// duration carries over for the next run.
    pub fn reset_for_new_run(&mut self) -> bool {
        if self.status != SessionStatus::Completed {
            return false;
        }
        let expected = self.expected_duration_seconds;
        let task_name = std::mem::take(&mut self.task_name);
        *self = Self::new(task_name, expected);
        true
    }

    pub fn record_quote_favorite(&mut self) -> u32 {
        self.favorite_quote_count += 1;
        self.favorite_quote_count
    }
}

/// Clamps a minute-count input to [1, 60]. Non-finite input falls back to
/// the caller-supplied default instead of erroring.
pub fn sanitize_minutes(input: f64, fallback_minutes: u32) -> u32 {
    if !input.is_finite() {
        return fallback_minutes.clamp(MIN_SESSION_MINUTES, MAX_SESSION_MINUTES);
    }
    let whole = input.floor() as i64;
    whole.clamp(i64::from(MIN_SESSION_MINUTES), i64::from(MAX_SESSION_MINUTES)) as u32
}
