//! Crate error type
//!
//! Only collaborator-facing APIs (decoding, storage, audio start) return these.
//! The frame loop logs and recovers instead.

/// Result alias that carries [`NoteFallError`].
pub type Result<T> = std::result::Result<T, NoteFallError>;

#[derive(Debug, thiserror::Error)]
pub enum NoteFallError {
    /// Malformed JSON for a pattern, level or settings blob
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    /// Filesystem-backed storage failure
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    /// A decoded note that cannot be played back
    #[error("note {index}: {reason}")]
    InvalidNote { index: usize, reason: String },
    #[error("storage: {0}")]
    Storage(String),
    #[error("audio: {0}")]
    Audio(String),
}

impl NoteFallError {
    pub fn invalid_note(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidNote {
            index,
            reason: reason.into(),
        }
    }
}
