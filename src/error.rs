use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O errors from filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Invalid path provided by the user.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The persisted tree file could not be interpreted.
    #[error("Tree store error: {0}")]
    Store(String),

    /// JSON encoding or decoding failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure reported by a command handler through the event bus.
///
/// `domain` names the subsystem that failed ("tree", "copy", "rmdir", ...)
/// and `message` is meant to be shown to the user as is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{domain}: {message}")]
pub struct CommandError {
    pub domain: &'static str,
    pub message: String,
}

impl CommandError {
    pub fn new(domain: &'static str, message: impl Into<String>) -> Self {
        Self {
            domain,
            message: message.into(),
        }
    }

    /// Wrap an application error raised by a collaborator.
    pub fn from_app(domain: &'static str, err: &AppError) -> Self {
        Self::new(domain, err.to_string())
    }
}
