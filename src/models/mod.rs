mod session;
mod task;

pub use session::FinalizedSession;
pub use task::FocusTask;
