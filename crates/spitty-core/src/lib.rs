//! spitty-core - Core library for bridging a tty-like byte stream to a polled SPI peer
//!
//! The peer (typically a small microcontroller) sits behind a half-duplex,
//! master-driven SPI link and cannot start a transfer on its own. It raises a
//! "data ready" line instead, and the host answers with a fixed enquiry
//! transaction to clock its buffered bytes out.
//!
//! # Building blocks
//!
//! - [`channel::Channel`] - the transaction executor. It owns the transport
//!   and serializes every exchange behind a single lock.
//! - [`sink`] - filters received buffers and forwards the payload to the
//!   currently open stream session.
//! - [`poller::Poller`] - deferred enquiry worker fed by the edge handler.
//! - [`port::Port`] - per-device state and the outbound write path.
//! - [`driver::Driver`] - bounded slot pool, attach/detach lifecycle.
//!
//! Transports and interrupt lines are pluggable through the
//! [`transport::SpiTransport`] and [`irq::EdgeSource`] traits.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use spitty_core::driver::Driver;
//! use spitty_core::irq::IntervalTimer;
//! use spitty_core::sink::ByteSink;
//!
//! let driver = Driver::new();
//! let port = driver.probe("atmega32u4", Box::new(bus), Box::new(IntervalTimer::default()))?;
//!
//! let sink: Arc<dyn ByteSink> = Arc::new(MyConsole::new());
//! port.open(&sink);
//! port.write(b"hello")?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod channel;
pub mod driver;
pub mod error;
pub mod irq;
pub mod poller;
pub mod port;
pub mod protocol;
pub mod sink;
pub mod transport;

#[cfg(test)]
mod testutil;

pub use error::{Error, Result};
