//! Error types for reader operations.
//!
//! Reader errors are transient from the engine's point of view: a failed
//! open is logged and the next candidate driver is tried, a failed close is
//! logged and ignored.

/// Result type alias for reader operations.
pub type Result<T> = std::result::Result<T, ReaderError>;

/// Errors that can occur while driving a reader device.
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Opening the device failed.
    #[error("Failed to open {device}: {message}")]
    OpenFailed { device: String, message: String },

    /// Device communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Device string could not be parsed.
    #[error(transparent)]
    InvalidDevice(#[from] taplink_core::Error),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReaderError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new open failed error.
    pub fn open_failed(device: impl Into<String>, message: impl Into<String>) -> Self {
        Self::OpenFailed {
            device: device.into(),
            message: message.into(),
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }
}
