//! Reader driver trait definition.
//!
//! This module defines the contract between the coordination engine and a
//! token reader driver. A driver answers to one or more driver names, opens
//! a device addressed by a `driver:path` string, pushes scans onto the
//! shared scan queue until it is closed, and can optionally detect plug and
//! play devices on its own.
//!
//! Async methods are declared with an explicit `+ Send` bound on the
//! returned future so the engine can drive readers from spawned Tokio
//! tasks. Implementations still write plain `async fn`.

use std::future::Future;

use taplink_core::{DeviceString, Scan};
use tokio::sync::mpsc;

use crate::error::Result;
use crate::types::ReaderInfo;

/// Producer side of the raw scan queue shared by every open reader.
pub type ScanSender = mpsc::UnboundedSender<Scan>;

/// Consumer side of the raw scan queue.
pub type ScanReceiver = mpsc::UnboundedReceiver<Scan>;

/// Token reader abstraction.
///
/// # Object Safety and Dynamic Dispatch
///
/// The trait is not object-safe because its async methods return
/// `impl Future`. Drivers are dispatched through the
/// [`AnyReader`](crate::devices::AnyReader) enum instead:
///
/// ```no_run
/// use taplink_core::DeviceString;
/// use taplink_readers::devices::AnyReader;
/// use taplink_readers::mock::MockReader;
/// use taplink_readers::traits::Reader;
///
/// # async fn example() -> taplink_readers::Result<()> {
/// let (reader, _handle) = MockReader::new("pn532_uart");
/// let mut reader = AnyReader::Mock(reader);
///
/// let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
/// reader.open(&"pn532_uart:/dev/ttyUSB0".parse()?, tx).await?;
/// assert!(reader.connected());
///
/// while let Some(scan) = rx.recv().await {
///     println!("{:?}", scan);
/// }
/// # Ok(())
/// # }
/// ```
///
/// # Ownership
///
/// A reader instance drives at most one device. After a successful
/// [`open`](Reader::open) the caller moves it into the reader registry,
/// which becomes its only owner until it is pruned or closed.
pub trait Reader: Send + Sync {
    /// Driver names this implementation answers to.
    ///
    /// Used to route a configured `driver:path` string to the driver that
    /// can open it.
    fn ids(&self) -> &[&'static str];

    /// Open the device and start pushing scans to `scans`.
    ///
    /// Scans are delivered asynchronously until [`close`](Reader::close) is
    /// called or the device goes away. Opening one device must not disturb
    /// devices opened by other reader instances.
    ///
    /// # Errors
    ///
    /// Returns an error if the device cannot be opened.
    fn open(
        &mut self,
        device: &DeviceString,
        scans: ScanSender,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Release the device. Calling it on a closed reader is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver failed to release the device cleanly.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Current liveness. Polled by the connection manager on every pass.
    ///
    /// Called while the reader registry is locked, so it must answer from
    /// state the driver already holds. No device I/O and no blocking.
    fn connected(&self) -> bool;

    /// Look for a plug and play device whose id is not in `existing`.
    ///
    /// Returns the full device string of the candidate, or `None`. Must
    /// return promptly.
    fn detect(&self, existing: &[String]) -> impl Future<Output = Option<String>> + Send;

    /// Describe the reader for status reporting.
    ///
    /// Same contract as [`connected`](Reader::connected): called under the
    /// registry lock, must not block.
    fn info(&self) -> ReaderInfo;

    /// Check whether this driver answers to `driver`.
    fn handles(&self, driver: &str) -> bool {
        self.ids().iter().any(|id| *id == driver)
    }
}
