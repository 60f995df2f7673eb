//! Reader and token coordination engine.
//!
//! This crate turns raw scans from any number of token readers into launch
//! events for an external launcher, while keeping the readers themselves
//! connected.
//!
//! # Components
//!
//! - [`registry::ReaderRegistry`]: open readers plus token session state
//!   and the stop signal.
//! - [`connection::ConnectionManager`]: once a second, prunes dead
//!   readers, opens configured ones and runs auto-detection.
//! - [`preprocessor::ScanPreprocessor`]: deduplicates scans, suppresses
//!   write echoes and emits launch events.
//! - [`exit_timer`]: delayed exit of launched software in hold mode.
//! - [`service::TokenService`]: wires all of the above together.
//!
//! The host platform plugs in through the [`platform::Platform`] trait.

pub mod config;
pub mod connection;
pub mod error;
pub mod exit_timer;
pub mod platform;
pub mod preprocessor;
pub mod registry;
pub mod service;

pub use config::{ReadersConfig, ServiceConfig, SharedConfig};
pub use error::{Result, ServiceError};
pub use platform::{Platform, ReaderSnapshot};
pub use registry::ReaderRegistry;
pub use service::{ServiceHandle, TokenService};
