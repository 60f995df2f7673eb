//! Timing and addressing constants for the token coordination engine.
//!
//! Durations are expressed in milliseconds so they can be used in `const`
//! context and converted with [`std::time::Duration::from_millis`] at the
//! call site.
//!
//! ```
//! use std::time::Duration;
//! use taplink_core::constants::READER_CHECK_INTERVAL_MS;
//!
//! let tick = Duration::from_millis(READER_CHECK_INTERVAL_MS);
//! assert_eq!(tick.as_secs(), 1);
//! ```

// ============================================================================
// Device Addressing
// ============================================================================

/// Separator between driver name and driver-specific path in a device
/// string.
///
/// ```
/// use taplink_core::constants::DEVICE_SEPARATOR;
///
/// let device = "pn532_uart:/dev/ttyUSB0";
/// let (driver, path) = device.split_once(DEVICE_SEPARATOR).unwrap();
/// assert_eq!(driver, "pn532_uart");
/// assert_eq!(path, "/dev/ttyUSB0");
/// ```
pub const DEVICE_SEPARATOR: char = ':';

// ============================================================================
// Connection Management
// ============================================================================

/// Interval between connection manager passes (prune, connect, detect).
///
/// # Value: 1000 milliseconds
pub const READER_CHECK_INTERVAL_MS: u64 = 1000;

// ============================================================================
// Feedback
// ============================================================================

/// Rolling window in which at most one failure sound is played.
///
/// A reader that keeps producing errors would otherwise beep continuously.
///
/// # Value: 1000 milliseconds
pub const FAIL_FEEDBACK_WINDOW_MS: u64 = 1000;

// ============================================================================
// Exit Timer
// ============================================================================

/// Default delay before launched software is exited after its token is
/// removed, when hold mode is enabled.
///
/// # Value: 0 seconds (exit immediately)
pub const DEFAULT_EXIT_DELAY_SECONDS: u64 = 0;

// ============================================================================
// Queues
// ============================================================================

/// Capacity of the outbound launch-event queue.
///
/// # Value: 32 tokens
pub const LAUNCH_QUEUE_CAPACITY: usize = 32;

// ============================================================================
// File Driver
// ============================================================================

/// Poll interval of the file reader driver.
///
/// # Value: 100 milliseconds
pub const FILE_POLL_INTERVAL_MS: u64 = 100;
