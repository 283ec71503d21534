use thiserror::Error;

pub type Result<T> = std::result::Result<T, BacklogError>;

#[derive(Debug, Error)]
pub enum BacklogError {
    #[error("Backlog item not found: {0}")]
    ItemNotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid backlog item ID: {0}")]
    InvalidItemId(String),

    #[error("Invalid category '{0}'. Valid: certifications, udemy, books, interview, concepts")]
    InvalidCategory(String),

    #[error("Invalid priority '{0}'. Valid priorities: high, medium, low")]
    InvalidPriority(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{0}")]
    Other(String),
}

impl BacklogError {
    /// True for errors caused by caller input rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::InvalidItemId(_)
                | Self::InvalidCategory(_)
                | Self::InvalidPriority(_)
        )
    }
}

#[cfg(feature = "sqlite-storage")]
impl From<rusqlite::Error> for BacklogError {
    fn from(e: rusqlite::Error) -> Self {
        Self::StorageError(e.to_string())
    }
}
