//! Error type for storage engines.

use hoard_core::HoardError;

/// Errors returned by a [`StorageEngine`](crate::StorageEngine).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("State serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl From<StorageError> for HoardError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io(e) => HoardError::Io(e),
            StorageError::Serialization(e) => HoardError::Serialization(e.to_string()),
            StorageError::Unavailable(msg) => HoardError::Storage(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::Unavailable("engine offline".to_string());
        assert_eq!(err.to_string(), "Storage unavailable: engine offline");
    }

    #[test]
    fn test_into_hoard_error() {
        let err: HoardError = StorageError::Unavailable("quota".to_string()).into();
        assert!(matches!(err, HoardError::Storage(_)));
        assert!(err.to_string().contains("quota"));

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: HoardError = StorageError::Io(io).into();
        assert!(matches!(err, HoardError::Io(_)));
    }
}
