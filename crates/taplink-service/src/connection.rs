//! Reader connection manager.
//!
//! Runs one pass at startup and then once per
//! [`READER_CHECK_INTERVAL_MS`]. Each pass:
//!
//! 1. prunes readers that report themselves disconnected;
//! 2. opens configured device strings that are not connected yet;
//! 3. lets every supported driver look for plug and play devices;
//! 4. hands the platform a snapshot of the connected readers.
//!
//! Device failures are logged and retried on the next pass. Only a
//! malformed configured device string or a failing update hook end a pass
//! early, and even then the manager keeps ticking.

use std::sync::Arc;
use std::time::Duration;

use taplink_core::DeviceString;
use taplink_core::constants::READER_CHECK_INTERVAL_MS;
use taplink_readers::{AnyReader, Reader, ScanSender};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::SharedConfig;
use crate::error::{Result, ServiceError};
use crate::platform::Platform;
use crate::registry::ReaderRegistry;

/// Periodic reader connection task.
pub struct ConnectionManager<P> {
    platform: Arc<P>,
    config: SharedConfig,
    registry: ReaderRegistry,
    scans: ScanSender,
}

impl<P: Platform> ConnectionManager<P> {
    pub fn new(
        platform: Arc<P>,
        config: SharedConfig,
        registry: ReaderRegistry,
        scans: ScanSender,
    ) -> Self {
        Self {
            platform,
            config,
            registry,
            scans,
        }
    }

    /// Tick until the registry's stop flag is raised.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(Duration::from_millis(READER_CHECK_INTERVAL_MS));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = self.registry.stopped() => {
                    debug!("Connection manager stopping");
                    break;
                }

                _ = ticker.tick() => {
                    if let Err(e) = self.tick().await {
                        error!("Error connecting readers: {}", e);
                    }
                }
            }
        }
    }

    /// Run one full connection pass.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidDeviceString`] for a malformed
    /// configured device, or [`ServiceError::ReadersHook`] if the platform
    /// rejects the snapshot.
    pub async fn tick(&self) -> Result<()> {
        self.registry.prune_disconnected().await;
        self.connect_configured().await?;
        if self.config.auto_detect_enabled() {
            self.auto_detect().await;
        }
        self.notify().await
    }

    async fn connect_configured(&self) -> Result<()> {
        let connected = self.registry.reader_ids().await;

        let mut queued: Vec<String> = Vec::new();
        for device in self.config.reader_connections() {
            if !connected.contains(&device) && !queued.contains(&device) {
                debug!("Configured reader not connected, adding: {}", device);
                queued.push(device);
            }
        }

        for device in queued {
            if self.registry.contains_reader(&device).await {
                continue;
            }

            let parsed = DeviceString::parse(&device).map_err(ServiceError::from)?;
            self.open_configured(&parsed).await;
        }

        Ok(())
    }

    /// Try every supported driver answering to the device's driver name
    /// until one opens it.
    async fn open_configured(&self, device: &DeviceString) {
        let snapshot = self.config.snapshot();
        let candidates = self
            .platform
            .supported_readers(&snapshot)
            .into_iter()
            .filter(|reader| reader.handles(device.driver()));

        for mut reader in candidates {
            debug!("Connecting to reader: {}", device);
            match reader.open(device, self.scans.clone()).await {
                Ok(()) => {
                    self.register(device.id(), reader).await;
                    info!("Opened reader: {}", device);
                    return;
                }
                Err(e) => error!("Error opening reader {}: {}", device, e),
            }
        }
    }

    async fn auto_detect(&self) {
        let snapshot = self.config.snapshot();

        for mut reader in self.platform.supported_readers(&snapshot) {
            if self.config.is_detect_excluded(reader.ids()) {
                continue;
            }

            let existing = self.registry.reader_ids().await;
            let Some(candidate) = reader.detect(&existing).await else {
                continue;
            };

            let device = match DeviceString::parse(&candidate) {
                Ok(device) => device,
                Err(e) => {
                    warn!("Reader detected an invalid device: {}", e);
                    continue;
                }
            };

            if let Err(e) = reader.open(&device, self.scans.clone()).await {
                error!("Error opening detected reader {}: {}", device, e);
            }

            if reader.connected() {
                info!("Opened detected reader: {}", device);
                self.register(device.id(), reader).await;
            } else if let Err(e) = reader.close().await {
                debug!("Error closing undetected reader {}: {}", device, e);
            }
        }
    }

    async fn register(&self, id: String, reader: AnyReader) {
        let label = id.clone();
        if let Some(mut displaced) = self.registry.insert_reader(id, reader).await
            && let Err(e) = displaced.close().await
        {
            warn!("Error closing replaced reader {}: {}", label, e);
        }
    }

    async fn notify(&self) -> Result<()> {
        let snapshot = self.registry.snapshot().await;
        self.platform
            .readers_update_hook(&snapshot)
            .map_err(|e| match e {
                ServiceError::ReadersHook { .. } => e,
                other => ServiceError::readers_hook(other.to_string()),
            })
    }
}
