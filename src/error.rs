//! Error types for the session engine.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    #[error("no active session: select a task before issuing timer commands")]
    NoActiveSession,

    #[error("session has not started; there is nothing to finalize")]
    NothingToFinalize,
}
