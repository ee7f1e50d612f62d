//! Transport abstraction for the SPI link
//!
//! The hardware cannot transmit without receiving: every transaction is a
//! full-duplex exchange of equal length. [`TransferMode`] only says whether
//! the caller is going to look at what came back, and picks the clock rate.

use crate::error::Result;
use crate::protocol::{DELAY_US, RX_SPEED_HZ, TX_SPEED_HZ};

/// How the received half of an exchange is used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    /// Poll: the received bytes are inspected (slow clock)
    ExchangeAndReceive,
    /// Write: the received bytes are discarded (fast clock)
    TransmitOnly,
}

impl TransferMode {
    /// Clock rate to run this kind of transaction at
    pub fn speed_hz(self) -> u32 {
        match self {
            Self::ExchangeAndReceive => RX_SPEED_HZ,
            Self::TransmitOnly => TX_SPEED_HZ,
        }
    }
}

/// One full-duplex exchange
///
/// `tx` and `rx` always have the same length.
#[derive(Debug)]
pub struct Transfer<'a> {
    /// Bytes clocked out to the peer
    pub tx: &'a [u8],
    /// Bytes clocked in from the peer
    pub rx: &'a mut [u8],
    /// Clock rate for this transfer
    pub speed_hz: u32,
    /// Delay after the transfer before the next one may start
    pub delay_us: u16,
}

impl<'a> Transfer<'a> {
    /// Build a transfer for the given mode
    ///
    /// Panics if the buffers differ in length.
    pub fn new(tx: &'a [u8], rx: &'a mut [u8], mode: TransferMode) -> Self {
        assert_eq!(tx.len(), rx.len(), "full-duplex buffers must match");
        Self {
            tx,
            rx,
            speed_hz: mode.speed_hz(),
            delay_us: DELAY_US,
        }
    }

    /// Number of bytes exchanged
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    /// True for a zero-length transfer
    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }
}

/// A synchronous full-duplex SPI link to the peer
///
/// `exchange` blocks for the duration of the physical transfer and the
/// requested post-transfer delay. Implementations must honor the per-transfer
/// `speed_hz` and `delay_us`.
pub trait SpiTransport: Send {
    /// Perform one exchange, filling `xfer.rx`
    fn exchange(&mut self, xfer: &mut Transfer<'_>) -> Result<()>;
}

impl SpiTransport for Box<dyn SpiTransport> {
    fn exchange(&mut self, xfer: &mut Transfer<'_>) -> Result<()> {
        (**self).exchange(xfer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_clock_rates() {
        assert_eq!(TransferMode::ExchangeAndReceive.speed_hz(), 9_600);
        assert_eq!(TransferMode::TransmitOnly.speed_hz(), 115_200);
    }

    #[test]
    fn test_transfer_carries_delay() {
        let tx = [1u8, 2, 3];
        let mut rx = [0u8; 3];
        let xfer = Transfer::new(&tx, &mut rx, TransferMode::TransmitOnly);
        assert_eq!(xfer.len(), 3);
        assert_eq!(xfer.delay_us, 25);
        assert_eq!(xfer.speed_hz, 115_200);
    }

    #[test]
    #[should_panic]
    fn test_transfer_rejects_mismatched_buffers() {
        let tx = [1u8, 2, 3];
        let mut rx = [0u8; 2];
        let _ = Transfer::new(&tx, &mut rx, TransferMode::ExchangeAndReceive);
    }
}
