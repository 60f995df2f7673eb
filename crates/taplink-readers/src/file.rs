//! File-backed token reader.
//!
//! Treats the contents of a text file as the token currently on the reader:
//! writing text to the file inserts a token, emptying or deleting it removes
//! the token. Useful for development and for feeding tokens from scripts.
//!
//! Addressed as `file:<path>`. The parent directory must exist when the
//! reader is opened; the file itself may be created later.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use taplink_core::constants::FILE_POLL_INTERVAL_MS;
use taplink_core::{DeviceString, Scan, Token};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::{
    ReaderError, Result,
    traits::{Reader, ScanSender},
    types::ReaderInfo,
};

/// Driver name of the file reader.
pub const FILE_DRIVER: &str = "file";

/// Reader polling a text file for token changes.
#[derive(Debug, Default)]
pub struct FileReader {
    device: Option<DeviceString>,
    connected: Arc<AtomicBool>,
    poller: Option<JoinHandle<()>>,
}

impl FileReader {
    pub fn new() -> Self {
        Self::default()
    }

    fn stop_poller(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
        self.connected.store(false, Ordering::Release);
    }
}

impl Drop for FileReader {
    fn drop(&mut self) {
        self.stop_poller();
    }
}

impl Reader for FileReader {
    fn ids(&self) -> &[&'static str] {
        &[FILE_DRIVER]
    }

    async fn open(&mut self, device: &DeviceString, scans: ScanSender) -> Result<()> {
        if !self.handles(device.driver()) {
            return Err(ReaderError::open_failed(
                device.id(),
                format!("driver {} not handled by file reader", device.driver()),
            ));
        }

        let path = PathBuf::from(device.path());
        if device.path().is_empty() {
            return Err(ReaderError::open_failed(device.id(), "empty file path"));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty())
            && !tokio::fs::try_exists(parent).await?
        {
            return Err(ReaderError::open_failed(
                device.id(),
                format!("parent directory {} does not exist", parent.display()),
            ));
        }

        self.stop_poller();

        let connected = Arc::new(AtomicBool::new(true));
        self.connected = Arc::clone(&connected);
        self.poller = Some(tokio::spawn(poll_file(
            device.id(),
            path,
            scans,
            connected,
        )));
        self.device = Some(device.clone());

        debug!("File reader watching {}", device.path());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.stop_poller();
        Ok(())
    }

    fn connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
            && self
                .poller
                .as_ref()
                .is_some_and(|poller| !poller.is_finished())
    }

    async fn detect(&self, _existing: &[String]) -> Option<String> {
        None
    }

    fn info(&self) -> ReaderInfo {
        let info = ReaderInfo::new("File", FILE_DRIVER).with_connected(self.connected());
        match &self.device {
            Some(device) => info.with_path(device.path()),
            None => info,
        }
    }
}

/// Read the current token text, `None` when the file is empty or missing.
async fn read_token_text(path: &Path) -> std::io::Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => {
            let text = contents.trim();
            Ok((!text.is_empty()).then(|| text.to_string()))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

async fn poll_file(id: String, path: PathBuf, scans: ScanSender, connected: Arc<AtomicBool>) {
    let mut ticker = tokio::time::interval(Duration::from_millis(FILE_POLL_INTERVAL_MS));
    let mut current: Option<String> = None;
    let mut last_error: Option<String> = None;

    loop {
        ticker.tick().await;

        let text = match read_token_text(&path).await {
            Ok(text) => {
                last_error = None;
                text
            }
            Err(e) => {
                let message = e.to_string();
                if last_error.as_deref() != Some(message.as_str()) {
                    warn!("File reader {} failed to read: {}", id, message);
                    if scans.send(Scan::failed(&id, message.clone())).is_err() {
                        break;
                    }
                    last_error = Some(message);
                }
                continue;
            }
        };

        if text == current {
            continue;
        }

        let scan = match &text {
            Some(text) => match Token::builder().text(text).source(&id).build() {
                Ok(token) => Scan::inserted(&id, token),
                Err(e) => Scan::failed(&id, e.to_string()),
            },
            None => Scan::removed(&id),
        };
        current = text;

        if scans.send(scan).is_err() {
            debug!("Scan queue closed, stopping file reader {}", id);
            break;
        }
    }

    connected.store(false, Ordering::Release);
}

#[cfg(test)]
mod tests {
    use super::*;
    use taplink_core::ScanKind;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_file_reader_reports_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tag.txt");
        let device = DeviceString::new(FILE_DRIVER, path.to_string_lossy());

        let mut reader = FileReader::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        reader.open(&device, tx).await.unwrap();
        assert!(reader.connected());

        tokio::fs::write(&path, "**launch.random:snes\n").await.unwrap();
        let scan = rx.recv().await.unwrap();
        assert_eq!(scan.source, device.id());
        let token = scan.token().unwrap();
        assert_eq!(token.text, "**launch.random:snes");
        assert!(!token.remote);

        tokio::fs::write(&path, "").await.unwrap();
        assert_eq!(rx.recv().await.unwrap().kind, ScanKind::Removed);

        reader.close().await.unwrap();
        assert!(!reader.connected());
    }

    #[tokio::test]
    async fn test_file_reader_missing_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("tag.txt");
        let device = DeviceString::new(FILE_DRIVER, path.to_string_lossy());

        let mut reader = FileReader::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let result = reader.open(&device, tx).await;

        assert!(matches!(result, Err(ReaderError::OpenFailed { .. })));
        assert!(!reader.connected());
    }

    #[tokio::test]
    async fn test_file_reader_stops_when_queue_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tag.txt");
        tokio::fs::write(&path, "abc").await.unwrap();
        let device = DeviceString::new(FILE_DRIVER, path.to_string_lossy());

        let mut reader = FileReader::new();
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        reader.open(&device, tx).await.unwrap();

        for _ in 0..50 {
            if !reader.connected() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(!reader.connected());
    }

    #[tokio::test]
    async fn test_file_reader_liveness_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tag.txt");
        let device = DeviceString::new(FILE_DRIVER, path.to_string_lossy());

        let mut reader = FileReader::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        reader.open(&device, tx).await.unwrap();

        // Liveness tracks the poller, not the filesystem.
        dir.close().unwrap();
        assert!(reader.connected());
        assert!(reader.info().connected);

        reader.close().await.unwrap();
        assert!(!reader.connected());
    }

    #[tokio::test]
    async fn test_file_reader_never_detects() {
        let reader = FileReader::new();
        assert_eq!(reader.detect(&[]).await, None);
        assert_eq!(reader.info().driver, FILE_DRIVER);
    }
}
