//! Error types for the Linux GPIO interrupt line

use thiserror::Error;

/// Linux GPIO specific errors
#[derive(Debug, Error)]
pub enum LinuxGpioError {
    /// Failed to request the GPIO line
    #[error("Failed to request GPIO line {line} on '{path}': {source}")]
    LineRequestFailed {
        path: String,
        line: u32,
        #[source]
        source: gpiocdev::Error,
    },

    /// Failed while waiting for an edge
    #[error("Failed to wait for edge event: {0}")]
    WaitFailed(#[source] gpiocdev::Error),

    /// Failed to read a pending edge
    #[error("Failed to read edge event: {0}")]
    ReadFailed(#[source] gpiocdev::Error),

    /// GPIO chip or device not specified
    #[error("No GPIO chip specified. Use dev=/dev/gpiochipN or gpiochip=N")]
    NoDevice,
}

impl From<LinuxGpioError> for spitty_core::Error {
    fn from(e: LinuxGpioError) -> Self {
        spitty_core::Error::Interrupt(std::io::Error::other(e.to_string()))
    }
}

/// Result type for Linux GPIO operations
pub type Result<T> = std::result::Result<T, LinuxGpioError>;
