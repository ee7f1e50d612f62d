//! Linux GPIO edge source implementation
//!
//! This module provides the `GpioIrq` struct that implements the
//! `EdgeSource` trait on top of the GPIO character device interface
//! (gpiocdev). The peer's data-ready pin is requested as an input with
//! rising-edge detection; the kernel queues edges until they are read.

use std::time::Duration;

use crate::error::{LinuxGpioError, Result};

use gpiocdev::line::{EdgeDetection, EdgeKind, Offset};
use gpiocdev::request::{Config, Request};

use spitty_core::irq::EdgeSource;

/// Configuration for the data-ready line
#[derive(Debug, Clone, Default)]
pub struct GpioIrqConfig {
    /// Device path (e.g., "/dev/gpiochip0")
    pub device: String,
    /// Line offset of the peer's data-ready output
    pub line: Offset,
    /// Treat the line as active-low (edge detection follows the logical level)
    pub active_low: bool,
}

impl GpioIrqConfig {
    /// Create a new configuration with the given device path and line
    pub fn new(device: impl Into<String>, line: Offset) -> Self {
        Self {
            device: device.into(),
            line,
            active_low: false,
        }
    }

    /// Invert the line polarity
    pub fn with_active_low(mut self, active_low: bool) -> Self {
        self.active_low = active_low;
        self
    }
}

/// Data-ready line watched through gpiocdev
pub struct GpioIrq {
    /// GPIO line request handle
    request: Request,
    /// Line offset, for log messages
    line: Offset,
}

impl GpioIrq {
    /// Request the line with rising-edge detection
    pub fn open(config: &GpioIrqConfig) -> Result<Self> {
        if config.device.is_empty() {
            return Err(LinuxGpioError::NoDevice);
        }

        log::debug!(
            "linux_gpio: Requesting line {} on {}",
            config.line,
            config.device
        );

        let mut req_config = Config::default();
        req_config
            .with_line(config.line)
            .as_input()
            .with_edge_detection(EdgeDetection::RisingEdge);
        if config.active_low {
            req_config.as_active_low();
        }

        let request = Request::from_config(req_config)
            .on_chip(&config.device)
            .with_consumer("spitty")
            .request()
            .map_err(|source| LinuxGpioError::LineRequestFailed {
                path: config.device.clone(),
                line: config.line,
                source,
            })?;

        log::info!(
            "linux_gpio: Watching {} line {} for rising edges{}",
            config.device,
            config.line,
            if config.active_low { " (active-low)" } else { "" }
        );

        Ok(Self {
            request,
            line: config.line,
        })
    }

    /// Wait for and consume one edge event
    fn next_edge(&mut self, timeout: Duration) -> Result<bool> {
        let ready = self
            .request
            .wait_edge_event(timeout)
            .map_err(LinuxGpioError::WaitFailed)?;
        if !ready {
            return Ok(false);
        }

        let event = self
            .request
            .read_edge_event()
            .map_err(LinuxGpioError::ReadFailed)?;
        log::trace!(
            "linux_gpio: line {} {:?} edge at {} ns",
            self.line,
            event.kind,
            event.timestamp_ns
        );
        Ok(event.kind == EdgeKind::Rising)
    }
}

impl EdgeSource for GpioIrq {
    fn wait_edge(&mut self, timeout: Duration) -> spitty_core::Result<bool> {
        self.next_edge(timeout).map_err(Into::into)
    }
}

/// Parse interrupt line options from a list of key-value pairs
///
/// # Supported Options
///
/// - `dev=/dev/gpiochipN` - GPIO chip device path (required, or use gpiochip)
/// - `gpiochip=N` - GPIO chip number (alternative to dev)
/// - `line=N` - data-ready line offset (required)
/// - `active_low=1` - invert line polarity (optional)
pub fn parse_options(options: &[(&str, &str)]) -> std::result::Result<GpioIrqConfig, String> {
    let mut config = GpioIrqConfig::default();
    let mut have_line = false;
    let mut gpiochip: Option<u32> = None;

    for (key, value) in options {
        match *key {
            "dev" => {
                config.device = value.to_string();
            }
            "gpiochip" => {
                gpiochip = Some(
                    value
                        .parse()
                        .map_err(|_| format!("Invalid gpiochip value: {}", value))?,
                );
            }
            "line" => {
                config.line = value
                    .parse()
                    .map_err(|_| format!("Invalid line value: {}", value))?;
                have_line = true;
            }
            "active_low" => {
                config.active_low = match *value {
                    "1" | "true" | "yes" => true,
                    "0" | "false" | "no" => false,
                    _ => return Err(format!("Invalid active_low value: {}", value)),
                };
            }
            _ => {
                log::warn!("linux_gpio: Unknown option: {}={}", key, value);
            }
        }
    }

    // Handle dev vs gpiochip
    if config.device.is_empty() {
        if let Some(n) = gpiochip {
            config.device = format!("/dev/gpiochip{}", n);
        } else {
            return Err("Either 'dev' or 'gpiochip' must be specified.\n\
                 e.g. linux_gpio:dev=/dev/gpiochip0,line=17"
                .to_string());
        }
    } else if gpiochip.is_some() {
        return Err("Only one of 'dev' or 'gpiochip' can be specified".to_string());
    }

    if !have_line {
        return Err("Missing required parameter: line".to_string());
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_with_dev() {
        let config = parse_options(&[("dev", "/dev/gpiochip1"), ("line", "17")]).unwrap();
        assert_eq!(config.device, "/dev/gpiochip1");
        assert_eq!(config.line, 17);
        assert!(!config.active_low);
    }

    #[test]
    fn test_parse_options_with_gpiochip() {
        let config =
            parse_options(&[("gpiochip", "0"), ("line", "4"), ("active_low", "1")]).unwrap();
        assert_eq!(config.device, "/dev/gpiochip0");
        assert_eq!(config.line, 4);
        assert!(config.active_low);
    }

    #[test]
    fn test_parse_options_errors() {
        assert!(parse_options(&[("line", "4")]).is_err());
        assert!(parse_options(&[("gpiochip", "0")]).is_err());
        assert!(parse_options(&[("dev", "/dev/gpiochip0"), ("gpiochip", "0"), ("line", "1")]).is_err());
        assert!(parse_options(&[("gpiochip", "0"), ("line", "x")]).is_err());
        assert!(parse_options(&[("gpiochip", "0"), ("line", "1"), ("active_low", "maybe")]).is_err());
    }

    #[test]
    fn test_open_without_device() {
        assert!(matches!(
            GpioIrq::open(&GpioIrqConfig::default()),
            Err(LinuxGpioError::NoDevice)
        ));
    }
}
