//! Deferred enquiry worker
//!
//! The edge handler only queues a poll request; a dedicated worker thread
//! picks it up and runs the blocking enquiry transaction through the port.
//! The queue holds one pending request, so edges that arrive while a poll is
//! already queued collapse into it. A single worker per device also keeps
//! deliveries in transaction order.

use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::error::{Error, Result};
use crate::port::Port;

/// Handle to a device's enquiry worker
pub struct Poller {
    queue: Option<SyncSender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl Poller {
    /// Start the worker for `port`
    pub fn spawn(port: Arc<Port>) -> Result<Self> {
        let (queue, requests) = mpsc::sync_channel::<()>(1);
        let name = format!("{}-poll", port.name());

        let worker = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                for () in requests {
                    match port.poll() {
                        Ok(n) if n > 0 => log::trace!("spi_tty: {}: {} bytes in", port.name(), n),
                        Ok(_) => {}
                        Err(Error::Detached) => break,
                        Err(e) => log::error!("spi_tty: {}: poll failed: {}", port.name(), e),
                    }
                }
            })
            .map_err(|source| Error::Spawn { name, source })?;

        Ok(Self {
            queue: Some(queue),
            worker: Some(worker),
        })
    }

    /// Top-half edge handler: queue a poll without blocking
    ///
    /// The returned closure is what gets registered on the interrupt line.
    pub fn edge_handler(&self) -> impl Fn() + Send + 'static {
        let queue = self.queue.clone();
        move || {
            if let Some(queue) = &queue {
                schedule(queue);
            }
        }
    }

    /// Queue a poll from the caller's context
    pub fn trigger(&self) {
        if let Some(queue) = &self.queue {
            schedule(queue);
        }
    }

    /// Stop accepting requests and wait for the worker to finish
    ///
    /// An in-flight poll runs to completion first. The worker only exits once
    /// every edge handler cloned from this poller has been dropped as well,
    /// so free the interrupt before calling this.
    pub fn shutdown(&mut self) {
        self.queue.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("spi_tty: enquiry worker panicked");
            }
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn schedule(queue: &SyncSender<()>) {
    match queue.try_send(()) {
        // Already pending: this edge is covered by the queued poll
        Ok(()) | Err(TrySendError::Full(())) => {}
        Err(TrySendError::Disconnected(())) => {
            log::debug!("spi_tty: edge after worker exit, ignored");
        }
    }
}
