//! Error types for the `submission_ingestor` crate.

/// All errors that can occur while ingesting a submission.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// One or more required settings are absent.
    #[error("Missing configuration: {}", missing.join(", "))]
    Config { missing: Vec<&'static str> },

    /// A setting is present but its value cannot be used.
    #[error("Invalid configuration: {setting}: {reason}")]
    InvalidConfig {
        setting: &'static str,
        reason: String,
    },

    /// The request body is unusable (bad JSON or missing fields).
    #[error("{0}")]
    InvalidRequest(String),

    /// The remote API answered with an error status.
    #[error("Remote API returned {status}: {message}")]
    Remote { status: u16, message: String },

    /// The remote rejected a write because the revision was stale or missing.
    #[error("Revision conflict on {path}: {message}")]
    Conflict { path: String, message: String },

    /// The remote API could not be reached at all.
    #[error("Remote API unreachable: {0}")]
    Unreachable(Box<dyn std::error::Error + Send + Sync>),

    /// The remote returned content that could not be decoded.
    #[error("Could not decode remote content: {0}")]
    Decode(String),
}

impl IngestError {
    /// Message reported by the remote store, if it sent one.
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            IngestError::Remote { message, .. } | IngestError::Conflict { message, .. } => {
                Some(message)
            }
            IngestError::Decode(message) => Some(message),
            _ => None,
        }
    }

    /// Returns `true` for optimistic-concurrency failures.
    pub fn is_conflict(&self) -> bool {
        matches!(self, IngestError::Conflict { .. })
    }
}

/// A type alias for `Result<T, IngestError>`.
pub type Result<T> = std::result::Result<T, IngestError>;
