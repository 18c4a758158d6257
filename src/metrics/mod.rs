mod types;

pub use types::{CompletionStatus, SessionMetrics};

use chrono::{DateTime, Utc};
use log::warn;
use std::cmp::Ordering;

use crate::timer::state::{SessionStatus, TimerSession};

/// Derives completion metrics at finalization and retains the last snapshot
/// it produced, so a defective finalize (no start timestamp) can still hand
/// the caller a best-effort result.
#[derive(Debug, Default)]
pub struct MetricsLedger {
    last: SessionMetrics,
}

impl MetricsLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_snapshot(&self) -> SessionMetrics {
        self.last.clone()
    }

    pub fn reset(&mut self) {
        self.last = SessionMetrics::default();
    }

    /// Computes the final metrics for `session` as of `ended_at`. Must run
    /// before the session record is marked Completed: an open pause interval
    /// is only visible while the status is still Paused.
    pub fn finalize(&mut self, session: &TimerSession, ended_at: DateTime<Utc>) -> SessionMetrics {
        let Some(started_at) = session.started_at else {
            warn!(
                "finalizing session {} with no start timestamp; keeping previous metrics",
                session.id
            );
            return self.last.clone();
        };

        let actual_elapsed = (ended_at - started_at).num_seconds().max(0) as u64;

        let mut paused = session.total_paused_seconds;
        if session.status == SessionStatus::Paused {
            if let Some(paused_at) = session.last_pause_at {
                paused += (ended_at - paused_at).num_seconds().max(0) as u64;
            }
        }

        let net = actual_elapsed.saturating_sub(paused) + session.extension_seconds;
        let expected = session.expected_duration_seconds;

        let metrics = SessionMetrics {
            actual_elapsed_seconds: actual_elapsed,
            final_paused_seconds: paused,
            net_effective_seconds: net,
            extension_seconds: session.extension_seconds,
            pause_count: session.pause_count,
            efficiency_ratio: efficiency_ratio(expected, net),
            completion: classify_completion(expected, net),
        };
        self.last = metrics.clone();
        metrics
    }
}

/// Expected over net, as a percentage capped at 100. Finishing under target
/// reads as full efficiency; overruns degrade proportionally.
pub fn efficiency_ratio(expected_seconds: u64, net_effective_seconds: u64) -> f64 {
    if net_effective_seconds == 0 {
        return 0.0;
    }
    ((expected_seconds as f64 / net_effective_seconds as f64) * 100.0).min(100.0)
}

pub fn classify_completion(expected_seconds: u64, net_effective_seconds: u64) -> CompletionStatus {
    match net_effective_seconds.cmp(&expected_seconds) {
        Ordering::Less => CompletionStatus::CompletedEarly,
        Ordering::Equal => CompletionStatus::CompletedOnTime,
        Ordering::Greater => CompletionStatus::CompletedLate,
    }
}
