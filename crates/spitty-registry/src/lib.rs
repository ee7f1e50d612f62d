//! Backend registry
//!
//! Opens an SPI transport and a data-ready interrupt line from their
//! command-line names. The binary only talks to this crate and
//! `spitty-core`; it never names a backend crate directly.
//!
//! ```ignore
//! let link = spitty_registry::open_link("linux_spi:dev=/dev/spidev0.0", "gpio:gpiochip=0,line=25")?;
//! let port = driver.probe("atmega32u4", link.bus, link.line)?;
//! ```

use std::collections::HashMap;
use std::time::Duration;

use spitty_core::irq::{EdgeSource, IntervalTimer};
use spitty_core::transport::SpiTransport;

#[cfg(feature = "dummy")]
pub use spitty_dummy::DummyMcu;

/// Parsed backend parameters
pub struct BackendParams {
    /// Backend name (as given)
    pub name: String,
    /// Key-value parameters
    pub params: HashMap<String, String>,
}

impl BackendParams {
    fn options(&self) -> Vec<(&str, &str)> {
        self.params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }
}

/// Parse a backend string into name and parameters
///
/// Format: "name" or "name:key1=value1,key2=value2"
pub fn parse_backend_params(s: &str) -> Result<BackendParams, Box<dyn std::error::Error>> {
    let (name, opts_str) = s.split_once(':').unwrap_or((s, ""));

    let mut params = HashMap::new();
    if !opts_str.is_empty() {
        for opt in opts_str.split(',') {
            if let Some((key, value)) = opt.split_once('=') {
                params.insert(key.to_string(), value.to_string());
            } else {
                return Err(
                    format!("Invalid parameter format: '{}' (expected key=value)", opt).into(),
                );
            }
        }
    }

    Ok(BackendParams {
        name: name.to_string(),
        params,
    })
}

/// An opened transport together with its interrupt line
pub struct Link {
    /// SPI transport to the peer
    pub bus: Box<dyn SpiTransport>,
    /// Data-ready line of the peer
    pub line: Box<dyn EdgeSource>,
    /// Handle on the emulated peer, when the dummy transport is used
    #[cfg(feature = "dummy")]
    pub peer: Option<spitty_dummy::DummyMcu>,
}

/// Open a transport and an interrupt line
///
/// # Arguments
/// * `transport` - Transport specification (e.g. "linux_spi:dev=/dev/spidev0.0")
/// * `irq` - Interrupt specification (e.g. "gpio:gpiochip=0,line=25" or "timer")
pub fn open_link(transport: &str, irq: &str) -> Result<Link, Box<dyn std::error::Error>> {
    let transport = parse_backend_params(transport)?;
    let irq = parse_backend_params(irq)?;

    match transport.name.as_str() {
        #[cfg(feature = "dummy")]
        "dummy" => {
            let peer = open_dummy(&transport)?;
            let line = match irq.name.as_str() {
                "dummy" => Box::new(peer.irq()) as Box<dyn EdgeSource>,
                _ => open_irq(&irq)?,
            };
            Ok(Link {
                bus: Box::new(peer.clone()),
                line,
                peer: Some(peer),
            })
        }
        _ => {
            let bus = open_transport(&transport)?;
            let line = open_irq(&irq)?;
            Ok(Link {
                bus,
                line,
                #[cfg(feature = "dummy")]
                peer: None,
            })
        }
    }
}

fn open_transport(
    params: &BackendParams,
) -> Result<Box<dyn SpiTransport>, Box<dyn std::error::Error>> {
    match params.name.as_str() {
        #[cfg(feature = "linux-spi")]
        "linux_spi" | "linux-spi" | "spidev" => open_linux_spi(params),

        _ => Err(format!("Unknown transport: {}", params.name).into()),
    }
}

fn open_irq(params: &BackendParams) -> Result<Box<dyn EdgeSource>, Box<dyn std::error::Error>> {
    match params.name.as_str() {
        "timer" => open_timer(params),

        #[cfg(feature = "linux-gpio")]
        "linux_gpio" | "linux-gpio" | "gpio" => open_linux_gpio(params),

        "dummy" => Err("The dummy interrupt line requires the dummy transport".into()),

        _ => Err(format!("Unknown interrupt source: {}", params.name).into()),
    }
}

#[cfg(feature = "dummy")]
fn open_dummy(
    params: &BackendParams,
) -> Result<spitty_dummy::DummyMcu, Box<dyn std::error::Error>> {
    let config = spitty_dummy::parse_options(&params.options())
        .map_err(|e| format!("Invalid dummy parameters: {}", e))?;

    log::info!("Opening emulated peer (echo: {})", config.echo);
    Ok(spitty_dummy::DummyMcu::new(config))
}

#[cfg(feature = "linux-spi")]
fn open_linux_spi(
    params: &BackendParams,
) -> Result<Box<dyn SpiTransport>, Box<dyn std::error::Error>> {
    use spitty_linux_spi::{parse_options, LinuxSpi};

    log::info!("Opening Linux SPI transport...");

    let config = parse_options(&params.options())
        .map_err(|e| format!("Invalid linux_spi parameters: {}", e))?;

    let spi = LinuxSpi::open(&config).map_err(|e| {
        format!(
            "Failed to open Linux SPI device: {}\n\
             Make sure the device exists and you have read/write permissions.\n\
             You may need to: sudo usermod -aG spi $USER",
            e
        )
    })?;

    log::info!("Opened {}", spi.path());
    Ok(Box::new(spi))
}

#[cfg(feature = "linux-gpio")]
fn open_linux_gpio(
    params: &BackendParams,
) -> Result<Box<dyn EdgeSource>, Box<dyn std::error::Error>> {
    use spitty_linux_gpio::{parse_options, GpioIrq};

    log::info!("Opening GPIO data-ready line...");

    let config = parse_options(&params.options())
        .map_err(|e| format!("Invalid linux_gpio parameters: {}", e))?;

    let irq = GpioIrq::open(&config).map_err(|e| {
        format!(
            "Failed to request GPIO line: {}\n\
             Make sure the chip exists and the line is not claimed by another consumer.",
            e
        )
    })?;

    Ok(Box::new(irq))
}

fn open_timer(params: &BackendParams) -> Result<Box<dyn EdgeSource>, Box<dyn std::error::Error>> {
    let timer = match params.params.get("interval") {
        Some(ms) => {
            let ms: u64 = ms
                .parse()
                .map_err(|_| format!("Invalid timer interval: {}", ms))?;
            if ms == 0 {
                return Err("Timer interval must be non-zero".into());
            }
            IntervalTimer::new(Duration::from_millis(ms))
        }
        None => IntervalTimer::default(),
    };

    log::info!("Polling every {} ms", timer.interval().as_millis());
    Ok(Box::new(timer))
}

/// Information about a backend
pub struct BackendInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all available transports (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_transports() -> Vec<BackendInfo> {
    let mut transports = Vec::new();

    #[cfg(feature = "dummy")]
    transports.push(BackendInfo {
        name: "dummy",
        aliases: &[],
        description: "Emulated peer for testing (echo=1 sends back what it receives)",
    });

    #[cfg(feature = "linux-spi")]
    transports.push(BackendInfo {
        name: "linux_spi",
        aliases: &["linux-spi", "spidev"],
        description: "Linux SPI device via spidev interface (dev=/dev/spidevX.Y)",
    });

    transports
}

/// Get information about all available interrupt sources
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_irqs() -> Vec<BackendInfo> {
    let mut irqs = Vec::new();

    #[cfg(feature = "linux-gpio")]
    irqs.push(BackendInfo {
        name: "linux_gpio",
        aliases: &["linux-gpio", "gpio"],
        description: "GPIO rising edge via character device (gpiochip=N,line=N)",
    });

    irqs.push(BackendInfo {
        name: "timer",
        aliases: &[],
        description: "Periodic enquiry without a data-ready line (interval=<ms>)",
    });

    #[cfg(feature = "dummy")]
    irqs.push(BackendInfo {
        name: "dummy",
        aliases: &[],
        description: "Data-ready line of the dummy transport",
    });

    irqs
}

fn names_short(backends: &[BackendInfo]) -> String {
    if backends.is_empty() {
        return "none (recompile with features)".to_string();
    }
    let names: Vec<&str> = backends.iter().map(|b| b.name).collect();
    names.join(", ")
}

/// Generate a short list of transport names for CLI help
pub fn transport_names_short() -> String {
    names_short(&available_transports())
}

/// Generate a short list of interrupt source names for CLI help
pub fn irq_names_short() -> String {
    names_short(&available_irqs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend_params() {
        let p = parse_backend_params("linux_spi:dev=/dev/spidev1.0,mode=3").unwrap();
        assert_eq!(p.name, "linux_spi");
        assert_eq!(p.params.get("dev").map(String::as_str), Some("/dev/spidev1.0"));
        assert_eq!(p.params.get("mode").map(String::as_str), Some("3"));

        let p = parse_backend_params("timer").unwrap();
        assert_eq!(p.name, "timer");
        assert!(p.params.is_empty());

        assert!(parse_backend_params("gpio:line").is_err());
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_unknown_backends() {
        assert!(open_link("nonexistent", "timer").is_err());
        assert!(open_link("dummy", "nonexistent").is_err());
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_timer_interval() {
        assert!(open_link("dummy", "timer:interval=0").is_err());
        assert!(open_link("dummy", "timer:interval=abc").is_err());
        assert!(open_link("dummy", "timer:interval=50").is_ok());
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_dummy_link_pairs_peer() {
        let mut link = open_link("dummy:echo=1", "dummy").unwrap();
        let peer = link.peer.take().unwrap();
        assert!(peer.config().echo);

        peer.send(b"x");
        assert!(link.line.wait_edge(Duration::from_millis(100)).unwrap());
    }

    #[test]
    fn test_dummy_irq_needs_dummy_transport() {
        let params = parse_backend_params("dummy").unwrap();
        assert!(open_irq(&params).is_err());
    }

    #[test]
    fn test_available_lists() {
        let irqs = available_irqs();
        assert!(irqs.iter().any(|b| b.name == "timer"));
        assert!(irq_names_short().contains("timer"));
    }
}
