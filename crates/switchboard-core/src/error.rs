use thiserror::Error;

/// Top-level error type for the Switchboard system.
///
/// Subsystem crates define their own error types and convert into
/// `SwitchboardError` where they cross the composition root, so that the
/// `?` operator works from the binary down to storage.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SwitchboardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("History store unavailable: {0}")]
    HistoryUnavailable(String),

    #[error("Capability error: {0}")]
    Capability(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Unknown variant: {0}")]
    UnknownVariant(String),
}

impl From<toml::de::Error> for SwitchboardError {
    fn from(err: toml::de::Error) -> Self {
        SwitchboardError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SwitchboardError {
    fn from(err: toml::ser::Error) -> Self {
        SwitchboardError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for SwitchboardError {
    fn from(err: serde_json::Error) -> Self {
        SwitchboardError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Switchboard operations.
pub type Result<T> = std::result::Result<T, SwitchboardError>;
