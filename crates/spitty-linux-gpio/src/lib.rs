//! spitty-linux-gpio - Linux GPIO data-ready interrupt line
//!
//! The peer raises a GPIO line when it has bytes to send. This crate watches
//! that line for rising edges through the GPIO character device interface
//! (gpiocdev) and exposes it as a `spitty_core::irq::EdgeSource`.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use spitty_linux_gpio::{GpioIrq, GpioIrqConfig};
//! use spitty_core::irq::EdgeSource;
//!
//! let mut irq = GpioIrq::open(&GpioIrqConfig::new("/dev/gpiochip0", 17))?;
//! if irq.wait_edge(Duration::from_secs(1))? {
//!     println!("peer has data");
//! }
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
//! - Linux kernel 4.8+ with GPIO character device support (kernel 5.5+ for v2 API)
//! - Access to `/dev/gpiochipN` devices (may require root or udev rules)

pub mod device;
pub mod error;

// Re-exports
pub use device::{parse_options, GpioIrq, GpioIrqConfig};
pub use error::{LinuxGpioError, Result};
