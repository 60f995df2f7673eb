//! Common types shared across reader driver implementations.

use serde::{Deserialize, Serialize};

/// Reader information.
///
/// A point-in-time description of one reader, handed to the platform
/// whenever the set of connected readers is refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderInfo {
    /// Human readable reader name (e.g., "PN532 UART").
    pub name: String,

    /// Driver name the reader was opened with.
    pub driver: String,

    /// Driver-specific path, once opened.
    pub path: Option<String>,

    /// Whether the device is currently live.
    pub connected: bool,
}

impl ReaderInfo {
    /// Create a new ReaderInfo for a reader that has not been opened.
    pub fn new(name: impl Into<String>, driver: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            driver: driver.into(),
            path: None,
            connected: false,
        }
    }

    /// Set the device path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the connection state.
    pub fn with_connected(mut self, connected: bool) -> Self {
        self.connected = connected;
        self
    }

    /// Registry id (`driver:path`) if the reader has a path.
    pub fn id(&self) -> Option<String> {
        self.path
            .as_ref()
            .map(|path| format!("{}:{}", self.driver, path))
    }
}
