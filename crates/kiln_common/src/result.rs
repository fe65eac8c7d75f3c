//! Common result and error types for the kiln toolchain.

/// The standard result type for fallible internal operations.
///
/// `Err` indicates a broken invariant inside kiln (a bug), not a user-facing
/// problem such as a missing include or a corrupt cache file. Those are
/// reported through the dedicated error types of each crate.
pub type KilnResult<T> = Result<T, InternalError>;

/// An internal error indicating a bug in kiln, not a user input problem.
#[derive(Debug, thiserror::Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
