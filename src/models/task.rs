use serde::{Deserialize, Serialize};

use crate::timer::state::DEFAULT_SESSION_MINUTES;

/// The task or activity a focus session runs against. Produced by the
/// caller's task list; the engine only reads the name and the target
/// duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusTask {
    pub name: String,
    pub expected_duration_seconds: u64,
}

impl FocusTask {
    pub fn new(name: impl Into<String>, expected_duration_seconds: u64) -> Self {
        Self {
            name: name.into(),
            expected_duration_seconds,
        }
    }

    /// A task with the stock 25-minute focus duration.
    pub fn with_default_duration(name: impl Into<String>) -> Self {
        Self::new(name, u64::from(DEFAULT_SESSION_MINUTES) * 60)
    }
}
