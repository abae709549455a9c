use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the matching pipeline.
///
/// Everything except `AuthenticationUnavailable` is propagated to the command
/// line boundary untouched; that one is recovered by serving default data.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("not able to authenticate: {0}")]
    AuthenticationUnavailable(String),

    #[error("track set not found: {0}")]
    TrackSetNotFound(String),

    #[error("cache file {} is corrupt: {message}", path.display())]
    CacheCorrupt { path: PathBuf, message: String },

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("upstream API failure: {0}")]
    Upstream(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MatchError {
    /// True when the error should be reported as a 404-equivalent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, MatchError::TrackSetNotFound(_))
    }
}

pub type MatchResult<T> = Result<T, MatchError>;
