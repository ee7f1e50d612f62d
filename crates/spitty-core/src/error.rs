//! Error types for spitty-core

use thiserror::Error;

/// Core error type
///
/// Transport failures are normally logged and swallowed by the executor, so
/// callers of `write` and `poll` only ever see allocation failures and
/// lifecycle errors. `Transfer` and `Interrupt` are what backends report
/// across the trait boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// A transfer buffer could not be allocated
    #[error("out of memory allocating a {0}-byte transfer buffer")]
    OutOfMemory(usize),

    /// Every device slot is occupied
    #[error("all {0} device slot(s) are in use")]
    CapacityExceeded(usize),

    /// The SPI exchange reported a failure
    #[error("SPI transfer failed: {0}")]
    Transfer(#[source] std::io::Error),

    /// The interrupt line reported a failure
    #[error("interrupt line error: {0}")]
    Interrupt(#[source] std::io::Error),

    /// Peer id is not in the supported device table
    #[error("unsupported device '{0}'")]
    UnsupportedDevice(String),

    /// No device is attached at this slot index
    #[error("no device attached at slot {0}")]
    NoSuchDevice(usize),

    /// The port was detached and its transport released
    #[error("device has been detached")]
    Detached,

    /// A worker thread could not be started
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        /// Thread name
        name: String,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using the core Error type
pub type Result<T> = std::result::Result<T, Error>;
