//! spitty-linux-spi - Linux spidev transport
//!
//! This crate provides the SPI link to the peer through the Linux
//! `/dev/spidevX.Y` character device interface.
//!
//! # Overview
//!
//! The Linux SPI driver exposes SPI controllers through character devices
//! at `/dev/spidevX.Y` where X is the bus number and Y is the chip select.
//! Every exchange is issued as a single full-duplex message with the clock
//! rate and turnaround delay requested by the caller, so poll and write
//! transactions can run at different speeds on the same handle.
//!
//! # Example
//!
//! ```no_run
//! use spitty_linux_spi::{LinuxSpi, LinuxSpiConfig};
//! use spitty_core::transport::{SpiTransport, Transfer, TransferMode};
//!
//! let config = LinuxSpiConfig::new("/dev/spidev0.0").with_mode(0);
//! let mut spi = LinuxSpi::open(&config)?;
//!
//! let tx = [0x05u8; 4];
//! let mut rx = [0u8; 4];
//! spi.exchange(&mut Transfer::new(&tx, &mut rx, TransferMode::ExchangeAndReceive))?;
//! println!("{:02X?}", rx);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Usage with the spitty CLI
//!
//! ```bash
//! spitty bridge -s linux_spi:dev=/dev/spidev0.0 -i linux_gpio:gpiochip=0,line=17
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel with spidev support enabled (`CONFIG_SPI_SPIDEV`)
//! - Read/write access to `/dev/spidevX.Y` device
//! - May require adding user to `spi` group or using udev rules

pub mod device;
pub mod error;

// Re-exports
pub use device::{mode, parse_options, LinuxSpi, LinuxSpiConfig};
pub use error::{LinuxSpiError, Result};
