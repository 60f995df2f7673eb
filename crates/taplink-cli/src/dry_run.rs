//! Platform that only logs.
//!
//! Launches are acknowledged by marking a pretend launcher as active, so
//! hold mode and the exit timer behave as they would on a real system.

use parking_lot::Mutex;
use taplink_readers::AnyReader;
use taplink_readers::file::FileReader;
use taplink_service::{Platform, ReaderSnapshot, ServiceConfig};
use tracing::{debug, info};

/// Launcher name reported while a dry-run launch is active.
pub const DRY_RUN_LAUNCHER: &str = "dry-run";

#[derive(Debug, Default)]
pub struct DryRunPlatform {
    active_launcher: Mutex<Option<String>>,
    readers: Mutex<Vec<String>>,
}

impl DryRunPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that software is running.
    pub fn launched(&self) {
        *self.active_launcher.lock() = Some(DRY_RUN_LAUNCHER.to_string());
    }
}

impl Platform for DryRunPlatform {
    fn active_launcher(&self) -> Option<String> {
        self.active_launcher.lock().clone()
    }

    async fn kill_launcher(&self) -> taplink_service::Result<()> {
        if let Some(launcher) = self.active_launcher.lock().take() {
            info!("Stopping launcher: {}", launcher);
        }
        Ok(())
    }

    fn play_success_sound(&self) {
        debug!("Success feedback");
    }

    fn play_fail_sound(&self) {
        info!("Fail feedback");
    }

    fn supported_readers(&self, _config: &ServiceConfig) -> Vec<AnyReader> {
        vec![AnyReader::File(FileReader::new())]
    }

    fn readers_update_hook(&self, readers: &ReaderSnapshot) -> taplink_service::Result<()> {
        let ids: Vec<String> = readers.keys().cloned().collect();
        let mut previous = self.readers.lock();
        if *previous != ids {
            info!("Connected readers: {:?}", ids);
            *previous = ids;
        }
        Ok(())
    }
}
