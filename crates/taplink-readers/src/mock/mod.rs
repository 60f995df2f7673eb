//! Mock driver implementations for testing and development.
//!
//! This module provides simulated readers that can be controlled
//! programmatically without requiring physical hardware.

pub mod reader;

pub use reader::{MockReader, MockReaderHandle};
