use std::time::Duration;
use thiserror::Error;

/// A convenience `Result` alias using [`CompanionError`].
pub type CompanionResult<T> = Result<T, CompanionError>;

/// Top-level error type for the companion.
///
/// Empty user input and blank generation output are deliberately absent:
/// both are answered with fixed sentences and never surface as errors.
#[derive(Error, Debug)]
pub enum CompanionError {
    /// Invalid or incomplete configuration, e.g. a missing backend credential.
    /// Raised at startup; not recoverable per request.
    #[error("Config error: {0}")]
    Config(String),

    /// The generation backend could not be reached or answered with a failure.
    #[error("Generation unavailable: {0}")]
    GenerationUnavailable(String),

    /// The caller-side bound on a generation call elapsed.
    #[error("Generation timed out after {0}ms")]
    Timeout(u64),

    /// A session key was rejected by the key policy.
    #[error("Session error: {0}")]
    Session(String),
}

impl CompanionError {
    /// Timeout error for a bound of `limit`, saturating at `u64::MAX` ms.
    pub fn timeout(limit: Duration) -> Self {
        Self::Timeout(u64::try_from(limit.as_millis()).unwrap_or(u64::MAX))
    }

    /// Whether the assistant should be reported as unreachable.
    ///
    /// True for backend failures and caller-side timeouts.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::GenerationUnavailable(_) | Self::Timeout(_))
    }
}
