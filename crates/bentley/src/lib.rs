//! Bentley - leveled logging for casebook services
//!
//! Every message is split into lines and each line is emitted as a `tracing`
//! event under the `bentley` target. The binary that installs the subscriber
//! decides formatting and filtering.
//!
//! ## Usage
//!
//! Functions: `info()`, `warn()`, `error()`, `debug()`, `verbose()`, `success()`
//!
//! Macros accept either a prepared message or format arguments:
//!
//! ```
//! let id = 7;
//! bentley::info!("stored case {id}");
//! bentley::warn!(&format!("case {} has no embedding", id));
//! ```
//!
//! `success` and `verbose` have no tracing level of their own. They map to
//! INFO and DEBUG and carry a `kind` field.

#[cfg(feature = "daemon-logs")]
pub mod daemon_logs;

/// Target used for every event emitted by this crate
pub const TARGET: &str = "bentley";

/// Info level logging - general information
pub fn info(message: &str) {
  for line in message.lines() {
    tracing::info!(target: "bentley", "{line}");
  }
}

/// Warning level logging - something needs attention
pub fn warn(message: &str) {
  for line in message.lines() {
    tracing::warn!(target: "bentley", "{line}");
  }
}

/// Error level logging - something went wrong
pub fn error(message: &str) {
  for line in message.lines() {
    tracing::error!(target: "bentley", "{line}");
  }
}

/// Debug level logging - detailed diagnostic information
pub fn debug(message: &str) {
  for line in message.lines() {
    tracing::debug!(target: "bentley", "{line}");
  }
}

pub fn verbose(message: &str) {
  for line in message.lines() {
    tracing::debug!(target: "bentley", kind = "verbose", "{line}");
  }
}

/// Success level logging - something completed successfully
pub fn success(message: &str) {
  for line in message.lines() {
    tracing::info!(target: "bentley", kind = "success", "{line}");
  }
}

#[macro_export]
macro_rules! info {
  ($fmt:literal $(, $arg:expr)* $(,)?) => {
    $crate::info(&format!($fmt $(, $arg)*)) // LCOV_EXCL_LINE
  };
  ($msg:expr) => {
    $crate::info(&$msg) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! warn {
  ($fmt:literal $(, $arg:expr)* $(,)?) => {
    $crate::warn(&format!($fmt $(, $arg)*)) // LCOV_EXCL_LINE
  };
  ($msg:expr) => {
    $crate::warn(&$msg) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! error {
  ($fmt:literal $(, $arg:expr)* $(,)?) => {
    $crate::error(&format!($fmt $(, $arg)*)) // LCOV_EXCL_LINE
  };
  ($msg:expr) => {
    $crate::error(&$msg) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! debug {
  ($fmt:literal $(, $arg:expr)* $(,)?) => {
    $crate::debug(&format!($fmt $(, $arg)*)) // LCOV_EXCL_LINE
  };
  ($msg:expr) => {
    $crate::debug(&$msg) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! verbose {
  ($fmt:literal $(, $arg:expr)* $(,)?) => {
    $crate::verbose(&format!($fmt $(, $arg)*)) // LCOV_EXCL_LINE
  };
  ($msg:expr) => {
    $crate::verbose(&$msg) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! success {
  ($fmt:literal $(, $arg:expr)* $(,)?) => {
    $crate::success(&format!($fmt $(, $arg)*)) // LCOV_EXCL_LINE
  };
  ($msg:expr) => {
    $crate::success(&$msg) // LCOV_EXCL_LINE
  };
}
