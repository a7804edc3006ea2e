//! Process-wide logging setup.

pub mod tracing;

pub use crate::tracing::{LogFormat, LogSettings};

/// Initialize JSON logging filtered by `RUST_LOG` (default `info`).
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init() {
    crate::tracing::init(&LogSettings::default());
}
