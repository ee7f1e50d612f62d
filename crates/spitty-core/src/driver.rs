//! Device lifecycle manager
//!
//! The [`Driver`] owns a fixed-size pool of device slots. Attaching a peer
//! builds its [`Port`], starts the enquiry worker, registers the edge
//! interrupt and names the node. Detaching undoes all of it in reverse and
//! hands the transport and interrupt line back.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};
use crate::irq::{request_edge_irq, EdgeSource, IrqHandle};
use crate::poller::Poller;
use crate::port::Port;
use crate::protocol::{is_supported, DRIVER_NAME, MAX_DEVICES};
use crate::transport::SpiTransport;

/// Everything held for one occupied slot
struct Attached {
    port: Arc<Port>,
    irq: IrqHandle,
    poller: Poller,
}

/// Resources handed back by [`Driver::detach`]
pub struct Released {
    /// The transport, unless a transaction panicked while holding it
    pub bus: Option<Box<dyn SpiTransport>>,
    /// The interrupt line, unless its listener panicked
    pub line: Option<Box<dyn EdgeSource>>,
}

/// Bounded pool of attached devices
pub struct Driver {
    slots: Mutex<Vec<Option<Attached>>>,
}

impl Driver {
    /// Driver with the default number of slots ([`MAX_DEVICES`])
    pub fn new() -> Self {
        Self::with_capacity(MAX_DEVICES)
    }

    /// Driver with `capacity` slots
    pub fn with_capacity(capacity: usize) -> Self {
        log::debug!("{}: {} slot(s)", DRIVER_NAME, capacity);
        Self {
            slots: Mutex::new((0..capacity).map(|_| None).collect()),
        }
    }

    /// Number of slots
    pub fn capacity(&self) -> usize {
        self.slots().len()
    }

    /// Number of occupied slots
    pub fn attached(&self) -> usize {
        self.slots().iter().filter(|s| s.is_some()).count()
    }

    /// Check the peer id, then [`attach`](Self::attach)
    pub fn probe(
        &self,
        id: &str,
        bus: Box<dyn SpiTransport>,
        line: Box<dyn EdgeSource>,
    ) -> Result<Arc<Port>> {
        if !is_supported(id) {
            return Err(Error::UnsupportedDevice(id.to_string()));
        }
        log::info!("{}: probing {}", DRIVER_NAME, id);
        self.attach(bus, line)
    }

    /// Bind a peer to the first free slot
    ///
    /// On failure nothing is left behind: the slot stays free and any worker
    /// already started is stopped again.
    pub fn attach(&self, bus: Box<dyn SpiTransport>, line: Box<dyn EdgeSource>) -> Result<Arc<Port>> {
        let mut slots = self.slots();
        let capacity = slots.len();
        let index = slots
            .iter()
            .position(Option::is_none)
            .ok_or(Error::CapacityExceeded(capacity))?;

        let port = Arc::new(Port::new(index, bus));
        let mut poller = Poller::spawn(port.clone())?;

        let irq = match request_edge_irq(port.name(), line, poller.edge_handler()) {
            Ok(irq) => irq,
            Err(e) => {
                log::error!("{}: failed to request interrupt: {}", DRIVER_NAME, e);
                poller.shutdown();
                port.release();
                return Err(e);
            }
        };

        log::info!("{}: registered {}", DRIVER_NAME, port.name());
        slots[index] = Some(Attached {
            port: port.clone(),
            irq,
            poller,
        });
        Ok(port)
    }

    /// Unbind the peer at `index`
    ///
    /// Stops the interrupt first, then lets an in-flight poll finish, then
    /// waits out an in-flight write before releasing the transport. Ports
    /// still held elsewhere report [`Error::Detached`] afterwards.
    pub fn detach(&self, index: usize) -> Result<Released> {
        let attached = self
            .slots()
            .get_mut(index)
            .and_then(Option::take)
            .ok_or(Error::NoSuchDevice(index))?;

        Ok(teardown(attached))
    }

    /// The port in slot `index`, if attached
    pub fn port(&self, index: usize) -> Option<Arc<Port>> {
        self.slots()
            .get(index)
            .and_then(|s| s.as_ref())
            .map(|a| a.port.clone())
    }

    /// All attached ports
    pub fn ports(&self) -> Vec<Arc<Port>> {
        self.slots()
            .iter()
            .flatten()
            .map(|a| a.port.clone())
            .collect()
    }

    fn slots(&self) -> MutexGuard<'_, Vec<Option<Attached>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        let attached: Vec<Attached> = self.slots().iter_mut().filter_map(Option::take).collect();
        for a in attached {
            teardown(a);
        }
    }
}

fn teardown(attached: Attached) -> Released {
    let Attached {
        port,
        irq,
        mut poller,
    } = attached;

    let line = irq.free();
    poller.shutdown();
    let bus = port.release();
    log::info!("{}: unregistered {}", DRIVER_NAME, port.name());

    Released { bus, line }
}
