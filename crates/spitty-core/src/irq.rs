//! Data-ready interrupt plumbing
//!
//! The peer signals pending data with a rising edge. Edges are picked up by a
//! small listener thread that only runs the top-half handler (which must not
//! block) and then waits for the next edge, so the line is re-armed once per
//! edge. Anything that sleeps, such as the SPI exchange, belongs in the
//! deferred worker (see [`crate::poller`]).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::protocol::ENQUIRY_INTERVAL_MS;

/// How long the listener waits for an edge before checking for shutdown
const WAIT_SLICE: Duration = Duration::from_millis(50);

/// A line that reports rising edges from the peer
pub trait EdgeSource: Send {
    /// Wait up to `timeout` for the next rising edge
    ///
    /// Returns `Ok(true)` if an edge was consumed, `Ok(false)` on timeout.
    fn wait_edge(&mut self, timeout: Duration) -> Result<bool>;

    /// Prepare the line before the first wait
    ///
    /// A failure aborts the interrupt request.
    fn arm(&mut self) -> Result<()> {
        Ok(())
    }
}

impl EdgeSource for Box<dyn EdgeSource> {
    fn wait_edge(&mut self, timeout: Duration) -> Result<bool> {
        (**self).wait_edge(timeout)
    }

    fn arm(&mut self) -> Result<()> {
        (**self).arm()
    }
}

/// Periodic edge source for wiring without a data-ready line
///
/// Fires once per interval, turning the edge-driven poller into a
/// timer-driven one.
#[derive(Debug)]
pub struct IntervalTimer {
    interval: Duration,
    next: Instant,
}

impl IntervalTimer {
    /// Fire every `interval`
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Instant::now() + interval,
        }
    }

    /// Configured period
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for IntervalTimer {
    fn default() -> Self {
        Self::new(Duration::from_millis(ENQUIRY_INTERVAL_MS))
    }
}

impl EdgeSource for IntervalTimer {
    fn wait_edge(&mut self, timeout: Duration) -> Result<bool> {
        let now = Instant::now();
        if now < self.next {
            let remaining = self.next - now;
            if remaining > timeout {
                thread::sleep(timeout);
                return Ok(false);
            }
            thread::sleep(remaining);
        }
        // Skip missed ticks rather than firing a burst
        self.next = Instant::now().max(self.next) + self.interval;
        Ok(true)
    }
}

/// A registered edge interrupt
///
/// Dropping the handle stops the listener; [`free`](Self::free) does the same
/// and hands the line back.
pub struct IrqHandle {
    name: String,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<Box<dyn EdgeSource>>>,
}

/// Register `handler` as the rising-edge handler of `line`
///
/// The handler runs on the listener thread, once per edge, and must return
/// quickly. The listener does not wait for the next edge until the handler
/// has returned. Fails without starting a listener if the line cannot be
/// armed.
pub fn request_edge_irq<F>(name: &str, mut line: Box<dyn EdgeSource>, handler: F) -> Result<IrqHandle>
where
    F: Fn() + Send + 'static,
{
    line.arm()?;

    let stop = Arc::new(AtomicBool::new(false));
    let thread_stop = stop.clone();
    let thread_name = format!("{}-irq", name);

    let thread = thread::Builder::new()
        .name(thread_name.clone())
        .spawn(move || {
            while !thread_stop.load(Ordering::Acquire) {
                match line.wait_edge(WAIT_SLICE) {
                    Ok(true) => handler(),
                    Ok(false) => {}
                    Err(e) => {
                        log::error!("spi_tty: interrupt line failed, no more polls: {}", e);
                        break;
                    }
                }
            }
            line
        })
        .map_err(|source| Error::Spawn {
            name: thread_name,
            source,
        })?;

    log::debug!("spi_tty: {} edge interrupt registered", name);

    Ok(IrqHandle {
        name: name.to_string(),
        stop,
        thread: Some(thread),
    })
}

impl IrqHandle {
    /// Unregister the handler and return the line
    ///
    /// Waits for a running handler to return. Returns `None` if the listener
    /// thread panicked.
    pub fn free(mut self) -> Option<Box<dyn EdgeSource>> {
        self.shutdown()
    }

    /// True while the listener is still waiting for edges
    pub fn is_active(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    fn shutdown(&mut self) -> Option<Box<dyn EdgeSource>> {
        let thread = self.thread.take()?;
        self.stop.store(true, Ordering::Release);
        match thread.join() {
            Ok(line) => {
                log::debug!("spi_tty: {} edge interrupt freed", self.name);
                Some(line)
            }
            Err(_) => {
                log::error!("spi_tty: {} interrupt listener panicked", self.name);
                None
            }
        }
    }
}

impl Drop for IrqHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;

    /// Edge source fed from a channel
    struct ChannelEdge(mpsc::Receiver<()>);

    impl EdgeSource for ChannelEdge {
        fn wait_edge(&mut self, timeout: Duration) -> Result<bool> {
            match self.0.recv_timeout(timeout) {
                Ok(()) => Ok(true),
                Err(mpsc::RecvTimeoutError::Timeout) => Ok(false),
                Err(mpsc::RecvTimeoutError::Disconnected) => Err(Error::Interrupt(
                    std::io::Error::new(std::io::ErrorKind::BrokenPipe, "line gone"),
                )),
            }
        }
    }

    fn wait_for(count: &AtomicUsize, n: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while count.load(Ordering::SeqCst) < n && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_handler_runs_once_per_edge() {
        let (tx, rx) = mpsc::channel();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();

        let irq = request_edge_irq("test", Box::new(ChannelEdge(rx)), move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        for _ in 0..3 {
            tx.send(()).unwrap();
        }
        wait_for(&count, 3);
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(irq.is_active());
        assert!(irq.free().is_some());
    }

    #[test]
    fn test_free_returns_line_without_edges() {
        let (_tx, rx) = mpsc::channel();
        let irq = request_edge_irq("idle", Box::new(ChannelEdge(rx)), || {}).unwrap();
        assert!(irq.free().is_some());
    }

    #[test]
    fn test_line_error_stops_listener() {
        let (tx, rx) = mpsc::channel::<()>();
        let irq = request_edge_irq("broken", Box::new(ChannelEdge(rx)), || {}).unwrap();
        drop(tx);

        let deadline = Instant::now() + Duration::from_secs(5);
        while irq.is_active() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(!irq.is_active());
    }

    #[test]
    fn test_interval_timer_fires() {
        let mut timer = IntervalTimer::new(Duration::from_millis(5));
        assert_eq!(timer.interval(), Duration::from_millis(5));
        assert!(timer.wait_edge(Duration::from_millis(50)).unwrap());
        assert!(timer.wait_edge(Duration::from_millis(50)).unwrap());
    }

    #[test]
    fn test_interval_timer_times_out_before_tick() {
        let mut timer = IntervalTimer::new(Duration::from_secs(60));
        assert!(!timer.wait_edge(Duration::from_millis(1)).unwrap());
    }
}
