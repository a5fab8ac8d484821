//! Error types for indexing, search and sync operations

use crate::error::AppError;
use crate::messaging::MessagingError;

/// Result type for search operations
pub type Result<T, E = SearchError> = std::result::Result<T, E>;

/// Errors raised by a search engine backend
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    /// Storage could not be opened or written
    #[error("Engine unavailable: {0}")]
    Unavailable(String),

    /// Index not found
    #[error("Index not found: {0}")]
    IndexNotFound(String),

    /// An existing index carries a schema that differs from its declared mapping
    #[error("Mapping conflict on index {index}: {reason}")]
    MappingConflict { index: String, reason: String },

    /// A document does not fit the mapping of its target index
    #[error("Document rejected by index {index}: {reason}")]
    MappingViolation { index: String, reason: String },

    /// Malformed mapping declaration
    #[error("Invalid mapping: {0}")]
    InvalidMapping(String),

    /// Tantivy error
    #[error("Tantivy error: {0}")]
    Tantivy(String),
}

impl EngineError {
    /// Whether the failure belongs to infrastructure rather than data
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::Unavailable(_) | EngineError::Tantivy(_))
    }
}

impl From<tantivy::TantivyError> for EngineError {
    fn from(err: tantivy::TantivyError) -> Self {
        match err {
            tantivy::TantivyError::IoError(e) => EngineError::Unavailable(e.to_string()),
            tantivy::TantivyError::OpenDirectoryError(e) => EngineError::Unavailable(e.to_string()),
            tantivy::TantivyError::OpenReadError(e) => EngineError::Unavailable(e.to_string()),
            tantivy::TantivyError::OpenWriteError(e) => EngineError::Unavailable(e.to_string()),
            other => EngineError::Tantivy(other.to_string()),
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Unavailable(err.to_string())
    }
}

/// Errors that can occur during search operations
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Engine failure, surfaced verbatim
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Request outside the accepted bounds
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Deadline expired before every branch finished
    #[error("Search timed out after {0} ms")]
    Timeout(u128),

    /// A fan-out branch panicked or was aborted
    #[error("Search branch failed: {0}")]
    Branch(String),
}

/// Errors returned by the sync service
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The target index is not registered
    #[error("Invalid index: {0}")]
    InvalidIndex(String),

    /// The engine refused or failed the write
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Fatal errors of the sync consumer supervisor
#[derive(Debug, thiserror::Error)]
pub enum ConsumerError {
    /// Every subscribe attempt in the retry budget failed
    #[error("Subscribe to {topic} failed after {attempts} attempts: {source}")]
    SubscribeExhausted {
        topic: String,
        attempts: u32,
        #[source]
        source: MessagingError,
    },
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidMapping(msg) => AppError::Configuration(msg),
            other => AppError::Engine(other.to_string()),
        }
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Engine(e) => e.into(),
            SearchError::InvalidRequest(msg) => AppError::Validation(msg),
            SearchError::Timeout(_) => AppError::Timeout(err.to_string()),
            _ => AppError::Internal(err.to_string()),
        }
    }
}

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::InvalidIndex(index) => {
                AppError::Configuration(format!("unknown index {}", index))
            }
            SyncError::Engine(e) => e.into(),
        }
    }
}

impl From<ConsumerError> for AppError {
    fn from(err: ConsumerError) -> Self {
        AppError::Messaging(err.to_string())
    }
}
