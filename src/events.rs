//! Notifications produced by the engine and the hooks it calls out through.
//!
//! The engine never talks to a global bus; callers hand it an [`EventSink`]
//! at construction and receive every transition as a typed event.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::models::FinalizedSession;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EngineEvent {
    /// Once per second while Running.
    Tick { remaining_seconds: u64 },
    Started { remaining_seconds: u64 },
    Paused { remaining_seconds: u64 },
    Resumed { remaining_seconds: u64 },
    /// Natural expiry: the countdown hit zero and the session is waiting for
    /// the caller to extend or finalize.
    AwaitingConfirmation { remaining_seconds: u64 },
    DurationChanged { minutes: u32 },
    /// Finalized session record, including derived metrics.
    Completed { session: FinalizedSession },
}

/// Observer for engine notifications. Delivery is synchronous; sinks must not
/// block.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

impl<F> EventSink for F
where
    F: Fn(EngineEvent) + Send + Sync,
{
    fn emit(&self, event: EngineEvent) {
        self(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    /// The countdown reached zero while Running.
    SessionExpired,
    /// The paused-state reminder elapsed.
    PauseReminder,
}

/// Fire-and-forget audio callback. The engine never awaits it.
pub type SoundHook = Arc<dyn Fn(SoundCue) + Send + Sync>;
