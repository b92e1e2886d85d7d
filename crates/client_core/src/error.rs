use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Persistence,
    Sync,
    Busy,
    State,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SortError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{operation} failed: {message}")]
    Persistence {
        operation: &'static str,
        message: String,
    },
    #[error("reload after {operation} failed: {message}")]
    Sync {
        operation: &'static str,
        message: String,
    },
    #[error("another ordering operation is still in flight")]
    Busy,
    #[error("no sort session is active")]
    NotSorting,
}

impl SortError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn persistence(operation: &'static str, source: anyhow::Error) -> Self {
        Self::Persistence {
            operation,
            message: format!("{source:#}"),
        }
    }

    pub fn sync(operation: &'static str, source: anyhow::Error) -> Self {
        Self::Sync {
            operation,
            message: format!("{source:#}"),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Persistence { .. } => ErrorCategory::Persistence,
            Self::Sync { .. } => ErrorCategory::Sync,
            Self::Busy => ErrorCategory::Busy,
            Self::NotSorting => ErrorCategory::State,
        }
    }

    /// Whether repeating the same action may succeed without user changes.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Persistence { .. } | Self::Sync { .. } | Self::Busy
        )
    }
}
