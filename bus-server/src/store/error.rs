//! Data store error types.

/// Errors that can occur when reading or writing timetable collections.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote store returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a response or data file
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// Record rejected by validation
    #[error("invalid {collection}: {message}")]
    Invalid {
        collection: &'static str,
        message: String,
    },

    /// A record with the same key already exists
    #[error("{collection} {key} already exists")]
    Duplicate { collection: &'static str, key: String },

    /// Record to delete does not exist
    #[error("{collection} {key} not found")]
    NotFound { collection: &'static str, key: String },

    /// Reading or writing a local file failed
    #[error("storage error: {message}")]
    Storage { message: String },
}

impl StoreError {
    pub(crate) fn invalid(collection: &'static str, message: impl Into<String>) -> Self {
        StoreError::Invalid {
            collection,
            message: message.into(),
        }
    }

    pub(crate) fn not_found(collection: &'static str, key: impl ToString) -> Self {
        StoreError::NotFound {
            collection,
            key: key.to_string(),
        }
    }
}
