use std::path::PathBuf;

use thiserror::Error;

/// Stable, machine-readable classification of a [`PersistError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidState,
    ValidationError,
    ReadError,
    WriteError,
    SummarizationError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidState => "INVALID_STATE",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::ReadError => "READ_ERROR",
            Self::WriteError => "WRITE_ERROR",
            Self::SummarizationError => "SUMMARIZATION_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Validation error at {path}: {message}")]
    Validation { path: PathBuf, message: String },

    #[error("Read error at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Write error at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Summarization failed for thread {thread_id}: {source}")]
    Summarization {
        thread_id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl PersistError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidState(_) => ErrorCode::InvalidState,
            Self::Validation { .. } => ErrorCode::ValidationError,
            Self::Read { .. } => ErrorCode::ReadError,
            Self::Write { .. } => ErrorCode::WriteError,
            Self::Summarization { .. } => ErrorCode::SummarizationError,
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    pub fn validation(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Validation {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    pub fn summarization(thread_id: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Summarization {
            thread_id: thread_id.into(),
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PersistError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_wire_names() {
        let err = PersistError::invalid_state("Invalid thread id: ../x");
        assert_eq!(err.code(), ErrorCode::InvalidState);
        assert_eq!(err.code().to_string(), "INVALID_STATE");

        let err = PersistError::read(
            ".threads",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.code().as_str(), "READ_ERROR");
        assert!(err.to_string().contains(".threads"));
    }

    #[test]
    fn test_summarization_keeps_source() {
        use std::error::Error as _;

        let err = PersistError::summarization("t1", anyhow::anyhow!("model timed out"));
        assert_eq!(err.code(), ErrorCode::SummarizationError);
        assert_eq!(err.source().map(|e| e.to_string()).as_deref(), Some("model timed out"));
    }
}
