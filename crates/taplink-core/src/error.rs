use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid device string: {device} (expected driver:path)")]
    InvalidDeviceString { device: String },

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

impl Error {
    pub fn invalid_device_string(device: impl Into<String>) -> Self {
        Self::InvalidDeviceString {
            device: device.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
