//! Runtime configuration of the coordination engine.
//!
//! [`ServiceConfig`] is the plain serde value loaded from disk.
//! [`SharedConfig`] wraps it for concurrent reads from the connection
//! manager and the scan pre-processor while still allowing updates at
//! runtime. Every accessor takes the lock for the duration of one read, so
//! no guard ever lives across an await point.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use taplink_core::DeviceString;
use taplink_core::constants::DEFAULT_EXIT_DELAY_SECONDS;

use crate::error::{Result, ServiceError};

/// Coordination engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Exit launched software when its token is removed
    pub hold_mode: bool,

    /// Delay between token removal and exit, in seconds
    pub exit_delay_secs: u64,

    /// Emit launch events for accepted tokens
    pub script_execution: bool,

    /// Launchers that are never exited by hold mode
    pub exit_blocklist: Vec<String>,

    /// Reader connection settings
    pub readers: ReadersConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            hold_mode: false,
            exit_delay_secs: DEFAULT_EXIT_DELAY_SECONDS,
            script_execution: true,
            exit_blocklist: Vec::new(),
            readers: ReadersConfig::default(),
        }
    }
}

/// Reader connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadersConfig {
    /// Device strings (`driver:path`) to keep connected
    pub connect: Vec<String>,

    /// Let drivers look for plug and play devices
    pub auto_detect: bool,

    /// Driver ids skipped by auto-detection
    pub detect_exclude: Vec<String>,
}

impl Default for ReadersConfig {
    fn default() -> Self {
        Self {
            connect: Vec::new(),
            auto_detect: true,
            detect_exclude: Vec::new(),
        }
    }
}

impl ServiceConfig {
    /// Set hold mode
    pub fn hold_mode(mut self, enabled: bool) -> Self {
        self.hold_mode = enabled;
        self
    }

    /// Set the exit delay in seconds
    pub fn exit_delay_secs(mut self, secs: u64) -> Self {
        self.exit_delay_secs = secs;
        self
    }

    /// Set whether accepted tokens emit launch events
    pub fn script_execution(mut self, enabled: bool) -> Self {
        self.script_execution = enabled;
        self
    }

    /// Add a launcher to the exit blocklist
    pub fn block_exit(mut self, launcher: impl Into<String>) -> Self {
        self.exit_blocklist.push(launcher.into());
        self
    }

    /// Add a configured reader connection
    pub fn connect(mut self, device: impl Into<String>) -> Self {
        self.readers.connect.push(device.into());
        self
    }

    /// Set whether auto-detection runs
    pub fn auto_detect(mut self, enabled: bool) -> Self {
        self.readers.auto_detect = enabled;
        self
    }

    /// Exclude a driver id from auto-detection
    pub fn exclude_detect(mut self, driver: impl Into<String>) -> Self {
        self.readers.detect_exclude.push(driver.into());
        self
    }

    /// Check that every configured reader connection is a valid device
    /// string.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidDeviceString`] for the first malformed
    /// entry.
    pub fn validate(&self) -> Result<()> {
        for device in &self.readers.connect {
            DeviceString::parse(device).map_err(ServiceError::from)?;
        }
        Ok(())
    }
}

/// Shared, runtime-updatable view of the configuration.
///
/// ```
/// use taplink_service::config::{ServiceConfig, SharedConfig};
///
/// let config = SharedConfig::new(ServiceConfig::default().hold_mode(true));
/// assert!(config.hold_mode_enabled());
///
/// config.update(|cfg| cfg.hold_mode = false);
/// assert!(!config.hold_mode_enabled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<ServiceConfig>>,
}

impl SharedConfig {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    pub fn hold_mode_enabled(&self) -> bool {
        self.inner.read().hold_mode
    }

    pub fn exit_delay(&self) -> Duration {
        Duration::from_secs(self.inner.read().exit_delay_secs)
    }

    pub fn script_execution_enabled(&self) -> bool {
        self.inner.read().script_execution
    }

    /// Configured device strings, in configuration order.
    pub fn reader_connections(&self) -> Vec<String> {
        self.inner.read().readers.connect.clone()
    }

    pub fn auto_detect_enabled(&self) -> bool {
        self.inner.read().readers.auto_detect
    }

    /// True when any of a driver's ids is excluded from auto-detection.
    pub fn is_detect_excluded(&self, ids: &[&str]) -> bool {
        let config = self.inner.read();
        ids.iter()
            .any(|id| config.readers.detect_exclude.iter().any(|ex| ex == id))
    }

    /// Case-insensitive exit blocklist lookup.
    pub fn is_exit_blocked(&self, launcher: &str) -> bool {
        self.inner
            .read()
            .exit_blocklist
            .iter()
            .any(|blocked| blocked.eq_ignore_ascii_case(launcher))
    }

    /// Copy of the current configuration.
    pub fn snapshot(&self) -> ServiceConfig {
        self.inner.read().clone()
    }

    /// Mutate the configuration in place.
    pub fn update(&self, f: impl FnOnce(&mut ServiceConfig)) {
        f(&mut *self.inner.write());
    }
}

impl From<ServiceConfig> for SharedConfig {
    fn from(config: ServiceConfig) -> Self {
        Self::new(config)
    }
}
