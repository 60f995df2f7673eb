//! Core types shared by the taplink reader and service crates.
//!
//! A [`Token`] is one scanned identity, a [`Scan`] is one event produced by
//! a reader (token inserted, token removed, or a read error) and a
//! [`DeviceString`] addresses a reader as `driver:path`.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
