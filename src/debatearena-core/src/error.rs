//! Error types for the debate session.

use thiserror::Error;

use crate::session::SessionPhase;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DebateError {
    #[error("{0}")]
    Validation(String),

    /// Carries the raw status text or exception message, shown to the user as-is.
    #[error("{0}")]
    Transport(String),

    #[error("'{agent}' is already debating on the other side")]
    SelectionConflict { agent: String },

    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("Invalid round count: expected {min}-{max}, got {value}")]
    InvalidRoundCount { value: i64, min: u32, max: u32 },

    /// The submission was dropped before the debate settled.
    #[error("Debate was interrupted before it finished.")]
    Interrupted,

    #[error("Session is busy ({0})")]
    SessionBusy(SessionPhase),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<reqwest::Error> for DebateError {
    fn from(err: reqwest::Error) -> Self {
        DebateError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for DebateError {
    fn from(err: serde_json::Error) -> Self {
        DebateError::Transport(err.to_string())
    }
}
