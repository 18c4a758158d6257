pub mod controller;
pub mod state;

pub use controller::{SessionController, TimerSnapshot};
pub use state::{SessionStatus, TickOutcome, TimerSession};
