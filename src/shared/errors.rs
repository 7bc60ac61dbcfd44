use thiserror::Error;

/// Storage errors raised by the key-value store and the task repository.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to read stored data: {0}")]
    ReadError(#[source] std::io::Error),

    #[error("Failed to write stored data: {0}")]
    WriteError(#[source] std::io::Error),

    #[error("Failed to parse stored data: {0}")]
    ParseError(#[source] serde_json::Error),

    #[error("Failed to serialize data: {0}")]
    SerializeError(#[source] serde_json::Error),

    #[error("Failed to create directory: {0}")]
    DirectoryError(String),
}

impl StorageError {
    pub fn directory(msg: impl Into<String>) -> Self {
        StorageError::DirectoryError(msg.into())
    }
}

/// Result of an operation whose in-memory effect always stands, but whose
/// durable side may have failed.
///
/// A failed load yields the fallback value together with the error; a failed
/// save after a mutation yields the mutated value together with the error.
#[derive(Debug)]
pub struct Outcome<T> {
    pub value: T,
    pub storage_error: Option<StorageError>,
}

impl<T> Outcome<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            storage_error: None,
        }
    }

    pub fn with_error(value: T, error: StorageError) -> Self {
        Self {
            value,
            storage_error: Some(error),
        }
    }

    /// True when the durable side succeeded too.
    pub fn is_persisted(&self) -> bool {
        self.storage_error.is_none()
    }

    pub fn into_value(self) -> T {
        self.value
    }
}
