//! Token reader abstraction layer for taplink.
//!
//! This crate defines the [`Reader`] trait that every token reader driver
//! implements, the [`AnyReader`] enum used to dispatch over drivers, and the
//! in-tree drivers used for development and testing.
//!
//! # Reader Contract
//!
//! A reader:
//!
//! - answers to one or more driver names ([`Reader::ids`]), used to route a
//!   configured `driver:path` device string to the right implementation;
//! - opens a device and pushes [`Scan`](taplink_core::Scan)s onto the shared
//!   scan queue until closed ([`Reader::open`], [`Reader::close`]);
//! - reports liveness when polled ([`Reader::connected`]);
//! - optionally detects plug and play devices ([`Reader::detect`]).
//!
//! ```no_run
//! use taplink_readers::devices::AnyReader;
//! use taplink_readers::file::FileReader;
//! use taplink_readers::traits::Reader;
//!
//! # async fn example() -> taplink_readers::Result<()> {
//! let mut reader = AnyReader::from(FileReader::new());
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//!
//! reader.open(&"file:/tmp/taplink/tag.txt".parse()?, tx).await?;
//! while let Some(scan) = rx.recv().await {
//!     println!("{:?}", scan.kind);
//! }
//! reader.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Drivers
//!
//! - [`mock::MockReader`]: programmable reader for tests.
//! - [`file::FileReader`]: treats a text file as the reader field.
//!
//! Hardware drivers live outside this crate and are added as new
//! [`AnyReader`] variants.

pub mod devices;
pub mod error;
pub mod file;
pub mod mock;
pub mod traits;
pub mod types;

pub use devices::AnyReader;
pub use error::{ReaderError, Result};
pub use traits::{Reader, ScanReceiver, ScanSender};
pub use types::ReaderInfo;
