//! CLI command implementations
//!
//! Every command but `list` attaches exactly one peer through the registry,
//! runs, and detaches it again when the [`Attached`] guard is dropped.

mod bridge;
mod list;
mod poll;
mod send;

pub use bridge::run_bridge;
pub use list::list_backends;
pub use poll::run_poll;
pub use send::run_send;

use std::sync::Arc;

use crate::cli::LinkArgs;
use spitty_core::driver::Driver;
use spitty_core::port::Port;

/// A probed peer
///
/// Dropping it detaches the port and releases the transport.
pub struct Attached {
    /// Keeps the slot alive
    _driver: Driver,
    /// The bound port
    pub port: Arc<Port>,
    /// The emulated peer, for the dummy transport
    #[cfg(feature = "dummy")]
    pub peer: Option<spitty_registry::DummyMcu>,
}

/// Open the link and probe the peer on it
pub fn attach(args: &LinkArgs) -> Result<Attached, Box<dyn std::error::Error>> {
    let link = spitty_registry::open_link(&args.transport, &args.irq)?;

    let driver = Driver::new();
    let port = driver.probe(&args.device, link.bus, link.line)?;
    log::info!("Attached {} on {}", args.device, port.name());

    Ok(Attached {
        _driver: driver,
        port,
        #[cfg(feature = "dummy")]
        peer: link.peer,
    })
}
