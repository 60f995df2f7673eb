//! Error types for the coordination engine.
//!
//! Only configuration defects and platform hook failures escape a
//! connection pass. Transient device errors are logged where they happen
//! and never reach these types.

/// Result type alias for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors surfaced by the coordination engine and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A configured reader device string is malformed.
    #[error("Invalid device string: {device}")]
    InvalidDeviceString { device: String },

    /// The platform rejected the reader snapshot.
    #[error("Readers update hook failed: {message}")]
    ReadersHook { message: String },

    /// A platform action failed.
    #[error("Platform error: {message}")]
    Platform { message: String },

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ServiceError {
    /// Create a new readers hook error.
    pub fn readers_hook(message: impl Into<String>) -> Self {
        Self::ReadersHook {
            message: message.into(),
        }
    }

    /// Create a new platform error.
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform {
            message: message.into(),
        }
    }
}

impl From<taplink_core::Error> for ServiceError {
    fn from(error: taplink_core::Error) -> Self {
        match error {
            taplink_core::Error::InvalidDeviceString { device } => {
                Self::InvalidDeviceString { device }
            }
            other => Self::Config(other.to_string()),
        }
    }
}
