//! Focus-timer session engine.
//!
//! Tracks one countdown session at a time: start/pause/resume, mid-session
//! extension, a two-step natural-expiry flow (extend or finalize), and
//! derived completion metrics. Rendering, sound playback, and persistence of
//! finished sessions stay with the caller, reached through [`EventSink`] and
//! [`SoundHook`].

pub mod clock;
pub mod error;
pub mod events;
pub mod metrics;
pub mod models;
pub mod reminder;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::EngineError;
pub use events::{EngineEvent, EventSink, SoundCue, SoundHook};
pub use metrics::{CompletionStatus, MetricsLedger, SessionMetrics};
pub use models::{FinalizedSession, FocusTask};
pub use timer::{SessionController, SessionStatus, TimerSession, TimerSnapshot};
