use thiserror::Error;

/// Top-level error type for Hoard.
///
/// Storage backends define their own error type and convert into this one,
/// so `?` works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HoardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("No async runtime available to drive the save scheduler")]
    NoRuntime,
}

impl From<toml::de::Error> for HoardError {
    fn from(err: toml::de::Error) -> Self {
        HoardError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for HoardError {
    fn from(err: toml::ser::Error) -> Self {
        HoardError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for HoardError {
    fn from(err: serde_json::Error) -> Self {
        HoardError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Hoard operations.
pub type Result<T> = std::result::Result<T, HoardError>;
