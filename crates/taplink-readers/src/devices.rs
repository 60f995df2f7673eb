//! Enum wrapper for reader driver dispatch.
//!
//! Native `async fn` in traits is not object-safe, so `Box<dyn Reader>` is
//! not available. [`AnyReader`] provides concrete type dispatch over every
//! in-tree driver instead, and is what the platform hands to the connection
//! manager and what the reader registry stores.
//!
//! # Examples
//!
//! ```
//! use taplink_readers::devices::AnyReader;
//! use taplink_readers::file::FileReader;
//! use taplink_readers::traits::Reader;
//!
//! let reader = AnyReader::from(FileReader::new());
//! assert!(reader.handles("file"));
//! assert!(!reader.connected());
//! ```

use taplink_core::DeviceString;

use crate::file::FileReader;
use crate::mock::MockReader;
use crate::traits::{Reader, ScanSender};
use crate::{ReaderInfo, Result};

/// Enum wrapper for reader driver dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyReader {
    /// Mock reader for development and testing.
    Mock(MockReader),

    /// Text file polled for token changes.
    File(FileReader),
}

impl Reader for AnyReader {
    fn ids(&self) -> &[&'static str] {
        match self {
            Self::Mock(reader) => reader.ids(),
            Self::File(reader) => reader.ids(),
        }
    }

    async fn open(&mut self, device: &DeviceString, scans: ScanSender) -> Result<()> {
        match self {
            Self::Mock(reader) => reader.open(device, scans).await,
            Self::File(reader) => reader.open(device, scans).await,
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self {
            Self::Mock(reader) => reader.close().await,
            Self::File(reader) => reader.close().await,
        }
    }

    fn connected(&self) -> bool {
        match self {
            Self::Mock(reader) => reader.connected(),
            Self::File(reader) => reader.connected(),
        }
    }

    async fn detect(&self, existing: &[String]) -> Option<String> {
        match self {
            Self::Mock(reader) => reader.detect(existing).await,
            Self::File(reader) => reader.detect(existing).await,
        }
    }

    fn info(&self) -> ReaderInfo {
        match self {
            Self::Mock(reader) => reader.info(),
            Self::File(reader) => reader.info(),
        }
    }
}

impl From<MockReader> for AnyReader {
    fn from(reader: MockReader) -> Self {
        Self::Mock(reader)
    }
}

impl From<FileReader> for AnyReader {
    fn from(reader: FileReader) -> Self {
        Self::File(reader)
    }
}
