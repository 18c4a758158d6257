use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CompletionStatus {
    CompletedEarly,
    CompletedOnTime,
    CompletedLate,
}

impl CompletionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::CompletedEarly => "Completed Early",
            CompletionStatus::CompletedOnTime => "Completed On Time",
            CompletionStatus::CompletedLate => "Completed Late",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetrics {
    pub actual_elapsed_seconds: u64,
    /// Paused time at finalization, including a still-open pause interval.
    pub final_paused_seconds: u64,
    pub net_effective_seconds: u64,
    pub extension_seconds: u64,
    pub pause_count: u32,
    /// Percentage in [0, 100]; 0 when no effective time was spent.
    pub efficiency_ratio: f64,
    pub completion: CompletionStatus,
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self {
            actual_elapsed_seconds: 0,
            final_paused_seconds: 0,
            net_effective_seconds: 0,
            extension_seconds: 0,
            pause_count: 0,
            efficiency_ratio: 0.0,
            completion: CompletionStatus::CompletedEarly,
        }
    }
}
