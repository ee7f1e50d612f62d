//! spitty-dummy - In-memory emulation of the SPI tty peer
//!
//! This crate provides a dummy microcontroller that speaks the enquiry
//! protocol from the peer's side. It's useful for testing and development
//! without real hardware.
//!
//! The emulated peer:
//! - shifts out the last byte of the previous transaction first (the stale
//!   echo the host always discards),
//! - answers each enquiry byte with the next byte from its outbox, or `0x00`
//!   when it has nothing to say,
//! - keeps every other non-padding byte it is sent,
//! - raises its data-ready edge while the outbox is non-empty.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use spitty_core::error::{Error, Result};
use spitty_core::irq::EdgeSource;
use spitty_core::protocol::{ENQUIRY, PAD};
use spitty_core::transport::{SpiTransport, Transfer};

/// Configuration for the dummy peer
#[derive(Debug, Clone, Default)]
pub struct DummyConfig {
    /// Queue everything received for sending back
    pub echo: bool,
}

/// One exchange as seen by the peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// Bytes the host clocked out
    pub tx: Vec<u8>,
    /// Bytes the peer clocked back
    pub rx: Vec<u8>,
    /// Clock rate the host used
    pub speed_hz: u32,
    /// Post-transfer delay the host requested
    pub delay_us: u16,
}

#[derive(Default)]
struct McuState {
    outbox: VecDeque<u8>,
    inbox: Vec<u8>,
    last_byte: u8,
    exchanges: Vec<Exchange>,
    fail: usize,
    overlaps: usize,
}

#[derive(Default)]
struct Edges {
    pending: Mutex<usize>,
    raised: Condvar,
}

/// Emulated peer
///
/// Clones share the same peer, so one clone can be handed to the driver as
/// the transport while another is used to inject and inspect traffic.
#[derive(Clone)]
pub struct DummyMcu {
    config: DummyConfig,
    state: Arc<Mutex<McuState>>,
    edges: Arc<Edges>,
    busy: Arc<AtomicBool>,
}

impl DummyMcu {
    /// Create a new dummy peer with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        Self {
            config,
            state: Arc::default(),
            edges: Arc::default(),
            busy: Arc::default(),
        }
    }

    /// Create a new dummy peer with default configuration
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Queue bytes for the host and raise the data-ready edge
    pub fn send(&self, data: &[u8]) {
        self.state().outbox.extend(data);
        self.raise_edge();
    }

    /// Bytes queued but not yet polled
    pub fn pending(&self) -> usize {
        self.state().outbox.len()
    }

    /// Everything the host has written so far
    pub fn received(&self) -> Vec<u8> {
        self.state().inbox.clone()
    }

    /// Every exchange so far, in order
    pub fn exchanges(&self) -> Vec<Exchange> {
        self.state().exchanges.clone()
    }

    /// Number of exchanges that started while another was still running
    pub fn overlaps(&self) -> usize {
        self.state().overlaps
    }

    /// Make the next `n` exchanges fail without touching the peer
    pub fn fail_next(&self, n: usize) {
        self.state().fail = n;
    }

    /// Data-ready line of this peer
    pub fn irq(&self) -> DummyIrq {
        DummyIrq {
            edges: self.edges.clone(),
        }
    }

    /// Signal a rising edge on the data-ready line
    pub fn raise_edge(&self) {
        let mut pending = self
            .edges
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *pending += 1;
        self.edges.raised.notify_all();
    }

    fn state(&self) -> MutexGuard<'_, McuState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn shift(&self, state: &mut McuState, tx: &[u8], rx: &mut [u8]) {
        if let Some(first) = rx.first_mut() {
            *first = state.last_byte;
        }
        for (out, &cmd) in rx.iter_mut().zip(tx).skip(1) {
            *out = if cmd == ENQUIRY {
                state.outbox.pop_front().unwrap_or(PAD)
            } else {
                PAD
            };
        }

        for &b in tx.iter().filter(|&&b| b != ENQUIRY && b != PAD) {
            state.inbox.push(b);
            if self.config.echo {
                state.outbox.push_back(b);
            }
        }
        if let Some(&last) = tx.last() {
            state.last_byte = last;
        }
    }
}

impl Default for DummyMcu {
    fn default() -> Self {
        Self::new_default()
    }
}

impl SpiTransport for DummyMcu {
    fn exchange(&mut self, xfer: &mut Transfer<'_>) -> Result<()> {
        if self.busy.swap(true, Ordering::SeqCst) {
            self.state().overlaps += 1;
        }

        let (failed, more) = {
            let mut state = self.state();
            let failed = state.fail > 0;
            if failed {
                state.fail -= 1;
            } else {
                self.shift(&mut state, xfer.tx, xfer.rx);
                state.exchanges.push(Exchange {
                    tx: xfer.tx.to_vec(),
                    rx: xfer.rx.to_vec(),
                    speed_hz: xfer.speed_hz,
                    delay_us: xfer.delay_us,
                });
            }
            (failed, !state.outbox.is_empty())
        };

        self.busy.store(false, Ordering::SeqCst);

        // Level-like behaviour: keep asking while data is queued
        if more {
            self.raise_edge();
        }

        if failed {
            log::debug!("dummy: injected transfer fault");
            return Err(Error::Transfer(std::io::Error::other("injected fault")));
        }
        Ok(())
    }
}

/// Data-ready line of a [`DummyMcu`]
pub struct DummyIrq {
    edges: Arc<Edges>,
}

impl EdgeSource for DummyIrq {
    fn wait_edge(&mut self, timeout: Duration) -> Result<bool> {
        let pending = self
            .edges
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let (mut pending, _) = self
            .edges
            .raised
            .wait_timeout_while(pending, timeout, |n| *n == 0)
            .unwrap_or_else(PoisonError::into_inner);
        if *pending == 0 {
            return Ok(false);
        }
        *pending -= 1;
        Ok(true)
    }
}

/// Parse dummy options from a list of key-value pairs
///
/// - `echo=1` - send back everything written
pub fn parse_options(options: &[(&str, &str)]) -> std::result::Result<DummyConfig, String> {
    let mut config = DummyConfig::default();

    for (key, value) in options {
        match *key {
            "echo" => {
                config.echo = match *value {
                    "1" | "true" | "yes" => true,
                    "0" | "false" | "no" => false,
                    _ => return Err(format!("Invalid echo value: {}", value)),
                };
            }
            _ => {
                log::warn!("dummy: Unknown option: {}={}", key, value);
            }
        }
    }

    Ok(config)
}
