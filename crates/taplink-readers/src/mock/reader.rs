//! Mock reader implementation for testing and development.
//!
//! This module provides a simulated token reader that can be controlled
//! programmatically: tests present and remove tokens, inject read errors,
//! unplug the device, offer a device for auto-detection, and make opens or
//! closes fail.

use std::sync::Arc;

use parking_lot::Mutex;
use taplink_core::{DeviceString, Scan, Token};

use crate::{
    ReaderError, Result,
    traits::{Reader, ScanSender},
    types::ReaderInfo,
};

/// Mock token reader.
///
/// Clones share the same simulated device, so a platform can hand out a
/// fresh [`AnyReader`](crate::devices::AnyReader) on every connection pass
/// while a test keeps driving the device through its
/// [`MockReaderHandle`].
///
/// # Examples
///
/// ```
/// use taplink_core::{ScanKind, Token};
/// use taplink_readers::mock::MockReader;
/// use taplink_readers::traits::Reader;
///
/// #[tokio::main]
/// async fn main() -> taplink_readers::Result<()> {
///     let (mut reader, handle) = MockReader::new("pn532_uart");
///     let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
///
///     reader.open(&"pn532_uart:/dev/ttyUSB0".parse()?, tx).await?;
///     handle.insert(Token::new("04A1B2C3", "").unwrap())?;
///
///     let scan = rx.recv().await.unwrap();
///     assert_eq!(scan.source, "pn532_uart:/dev/ttyUSB0");
///     assert!(matches!(scan.kind, ScanKind::Inserted(_)));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockReader {
    /// Driver names this mock answers to
    ids: Vec<&'static str>,

    /// Device name
    name: String,

    /// Simulated device, shared with the handle
    state: Arc<Mutex<MockState>>,
}

#[derive(Debug, Default)]
struct MockState {
    device: Option<DeviceString>,
    scans: Option<ScanSender>,
    connected: bool,
    detectable: Option<String>,
    open_failure: Option<String>,
    open_disconnected: bool,
    open_attempts: Vec<String>,
    close_failure: Option<String>,
    closes: usize,
}

impl MockReader {
    /// Create a mock reader answering to a single driver name.
    pub fn new(driver: &'static str) -> (Self, MockReaderHandle) {
        Self::with_ids(vec![driver], format!("Mock {driver} Reader"))
    }

    /// Create a mock reader answering to several driver names.
    pub fn with_ids(ids: Vec<&'static str>, name: impl Into<String>) -> (Self, MockReaderHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));

        let reader = Self {
            ids,
            name: name.into(),
            state: Arc::clone(&state),
        };

        (reader, MockReaderHandle { state })
    }

    fn primary_driver(&self) -> &'static str {
        self.ids.first().copied().unwrap_or("mock")
    }
}

impl Reader for MockReader {
    fn ids(&self) -> &[&'static str] {
        &self.ids
    }

    async fn open(&mut self, device: &DeviceString, scans: ScanSender) -> Result<()> {
        let mut state = self.state.lock();
        state.open_attempts.push(device.id());

        if let Some(message) = state.open_failure.clone() {
            return Err(ReaderError::open_failed(device.id(), message));
        }

        if !self.handles(device.driver()) {
            return Err(ReaderError::open_failed(
                device.id(),
                format!("driver {} not handled by {}", device.driver(), self.name),
            ));
        }

        state.device = Some(device.clone());
        state.scans = Some(scans);
        state.connected = !state.open_disconnected;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        state.connected = false;
        state.scans = None;
        state.closes += 1;

        match &state.close_failure {
            Some(message) => Err(ReaderError::communication(message.clone())),
            None => Ok(()),
        }
    }

    fn connected(&self) -> bool {
        self.state.lock().connected
    }

    async fn detect(&self, existing: &[String]) -> Option<String> {
        let state = self.state.lock();
        let path = state.detectable.as_ref()?;
        let id = DeviceString::new(self.primary_driver(), path.clone()).id();

        if existing.contains(&id) {
            None
        } else {
            Some(id)
        }
    }

    fn info(&self) -> ReaderInfo {
        let state = self.state.lock();
        let info = ReaderInfo::new(self.name.clone(), self.primary_driver())
            .with_connected(state.connected);

        match &state.device {
            Some(device) => ReaderInfo {
                driver: device.driver().to_string(),
                ..info.with_path(device.path())
            },
            None => info,
        }
    }
}

/// Handle for controlling a mock reader.
#[derive(Debug, Clone)]
pub struct MockReaderHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockReaderHandle {
    /// Present a token to the reader.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::Disconnected`] if the reader is not open or the
    /// scan queue has been dropped.
    pub fn insert(&self, token: Token) -> Result<()> {
        self.push(|source| Scan::inserted(source, token.with_source(source)))
    }

    /// Take the current token away from the reader.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::Disconnected`] if the reader is not open.
    pub fn remove(&self) -> Result<()> {
        self.push(|source| Scan::removed(source))
    }

    /// Report a read failure.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::Disconnected`] if the reader is not open.
    pub fn fail(&self, message: impl Into<String>) -> Result<()> {
        let message = message.into();
        self.push(|source| Scan::failed(source, message))
    }

    fn push(&self, scan: impl FnOnce(&str) -> Scan) -> Result<()> {
        let state = self.state.lock();
        let (Some(device), Some(scans)) = (&state.device, &state.scans) else {
            return Err(ReaderError::disconnected("mock reader not open"));
        };

        let id = device.id();
        if !state.connected {
            return Err(ReaderError::disconnected(id));
        }

        scans
            .send(scan(&id))
            .map_err(|_| ReaderError::disconnected(id))
    }

    /// Simulate the device being unplugged.
    pub fn unplug(&self) {
        self.state.lock().connected = false;
    }

    /// Make a device at `path` visible to auto-detection.
    pub fn offer_device(&self, path: impl Into<String>) {
        self.state.lock().detectable = Some(path.into());
    }

    /// Stop offering a device to auto-detection.
    pub fn withdraw_device(&self) {
        self.state.lock().detectable = None;
    }

    /// Make every following open fail with `message`.
    pub fn fail_opens(&self, message: impl Into<String>) {
        self.state.lock().open_failure = Some(message.into());
    }

    /// Let opens succeed again.
    pub fn succeed_opens(&self) {
        self.state.lock().open_failure = None;
    }

    /// Make every following close report `message` after releasing the
    /// device.
    pub fn fail_closes(&self, message: impl Into<String>) {
        self.state.lock().close_failure = Some(message.into());
    }

    /// Make following opens succeed without the device coming up.
    pub fn open_disconnected(&self, disconnected: bool) {
        self.state.lock().open_disconnected = disconnected;
    }

    /// Device strings passed to `open`, in call order.
    pub fn open_attempts(&self) -> Vec<String> {
        self.state.lock().open_attempts.clone()
    }

    /// Number of `close` calls.
    pub fn close_count(&self) -> usize {
        self.state.lock().closes
    }

    /// Whether the simulated device is currently live.
    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }
}
