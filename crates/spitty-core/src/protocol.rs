//! Wire constants of the enquiry protocol
//!
//! These values are fixed by the peer firmware and must stay bit-exact.

/// ASCII ENQ, clocked out to ask the peer for buffered data
pub const ENQUIRY: u8 = 0x05;

/// Padding byte meaning "no data"; dropped on receive
pub const PAD: u8 = 0x00;

/// Size of one enquiry transaction, and the cap on a single write
pub const MSG_LEN: usize = 64;

/// Clock rate for enquiry (exchange-and-receive) transactions
pub const RX_SPEED_HZ: u32 = 9_600;

/// Clock rate for write (transmit-only) transactions
pub const TX_SPEED_HZ: u32 = 115_200;

/// Turnaround delay applied after every transaction, in microseconds
pub const DELAY_US: u16 = 25;

/// Default period of the timer-driven enquiry, for peers without a
/// data-ready line
pub const ENQUIRY_INTERVAL_MS: u64 = 200;

/// Base name of the stream nodes (`ttySPI0`, ...)
pub const TTY_NAME: &str = "ttySPI";

/// Driver name reported in logs
pub const DRIVER_NAME: &str = "spiserialplain";

/// Number of device slots
pub const MAX_DEVICES: usize = 1;

/// Peer ids this driver binds to
pub const SUPPORTED_DEVICES: &[&str] = &["atmega32u4"];

/// Check a peer id against [`SUPPORTED_DEVICES`]
pub fn is_supported(id: &str) -> bool {
    SUPPORTED_DEVICES.contains(&id)
}

/// The fixed enquiry transaction: `MSG_LEN - 1` ENQ bytes and a NUL terminator
///
/// 64 bytes on the wire. Older peer firmware was paired with a 65-byte
/// enquiry (64 ENQ then NUL); expect one fewer payload byte per poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnquiryPattern([u8; MSG_LEN]);

impl EnquiryPattern {
    /// Build the pattern
    pub const fn new() -> Self {
        let mut buf = [ENQUIRY; MSG_LEN];
        buf[MSG_LEN - 1] = PAD;
        Self(buf)
    }

    /// Raw bytes to transmit
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Default for EnquiryPattern {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<[u8]> for EnquiryPattern {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
