use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::SessionMetrics;
use crate::timer::state::{SessionStatus, TimerSession};

/// Snapshot of a finished session, handed to the caller through the
/// `Completed` notification. Persisting it is the caller's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedSession {
    pub id: String,
    pub task_name: String,
    pub status: SessionStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub expected_duration_seconds: u64,
    pub favorite_quote_count: u32,
    pub metrics: SessionMetrics,
}

impl FinalizedSession {
    pub fn from_session(session: &TimerSession, metrics: SessionMetrics) -> Self {
        Self {
            id: session.id.clone(),
            task_name: session.task_name.clone(),
            status: session.status,
            started_at: session.started_at,
            ended_at: session.ended_at,
            expected_duration_seconds: session.expected_duration_seconds,
            favorite_quote_count: session.favorite_quote_count,
            metrics,
        }
    }
}
