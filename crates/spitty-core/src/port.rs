//! Per-device state and the stream-facing operations
//!
//! A [`Port`] is what a tty node would be backed by: the locked transport,
//! the weak link to the open session, and the cached enquiry pattern.

use std::sync::Arc;

use crate::channel::Channel;
use crate::error::Result;
use crate::protocol::{EnquiryPattern, MSG_LEN, TTY_NAME};
use crate::sink::{ByteSink, SinkSlot};
use crate::transport::{SpiTransport, TransferMode};

/// State of one attached peer
#[derive(Debug)]
pub struct Port {
    index: usize,
    name: String,
    channel: Channel,
    sink: SinkSlot,
    enquiry: EnquiryPattern,
}

impl Port {
    /// Build the state for slot `index` around `bus`
    pub fn new(index: usize, bus: Box<dyn SpiTransport>) -> Self {
        Self {
            index,
            name: format!("{}{}", TTY_NAME, index),
            channel: Channel::new(bus),
            sink: SinkSlot::new(),
            enquiry: EnquiryPattern::new(),
        }
    }

    /// Slot index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Node name (`ttySPI<index>`)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The enquiry pattern sent on every poll
    pub fn enquiry_pattern(&self) -> &EnquiryPattern {
        &self.enquiry
    }

    /// Attach an open session; inbound data goes to `sink` from now on
    pub fn open(&self, sink: &Arc<dyn ByteSink>) {
        log::debug!("spi_tty: {} opened", self.name);
        self.sink.set(sink);
    }

    /// Detach the session; inbound data is dropped until the next open
    pub fn close(&self) {
        log::debug!("spi_tty: {} closed", self.name);
        self.sink.clear();
    }

    /// True while a live session is attached
    pub fn is_open(&self) -> bool {
        self.sink.is_set()
    }

    /// Transmit up to [`MSG_LEN`] bytes of `buf`
    ///
    /// Returns how many bytes were taken. Anything past the cap is left for
    /// the caller to resubmit. Bytes clocked in during the write are thrown
    /// away, and a failed exchange still counts as accepted.
    pub fn write(&self, buf: &[u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let len = buf.len().min(MSG_LEN);
        self.channel.transact(&buf[..len], TransferMode::TransmitOnly)?;
        Ok(len)
    }

    /// Room for the next write
    ///
    /// Always [`MSG_LEN`], regardless of how busy the link is. It is an upper
    /// bound per call, not a flow-control signal.
    pub fn write_room(&self) -> usize {
        MSG_LEN
    }

    /// Run one enquiry transaction and deliver what the peer sent
    ///
    /// Returns the number of payload bytes handed to the session (zero when
    /// no session is open).
    /// Delivery happens before the transaction lock is released, so
    /// concurrent polls deliver in the order their exchanges ran.
    pub fn poll(&self) -> Result<usize> {
        self.channel.transact_with(
            self.enquiry.as_bytes(),
            TransferMode::ExchangeAndReceive,
            |rx| self.sink.deliver(&rx),
        )
    }

    /// Release the transport once the in-flight transaction, if any, is done
    pub(crate) fn release(&self) -> Option<Box<dyn SpiTransport>> {
        self.sink.clear();
        self.channel.close()
    }

    /// False once the port has been detached
    pub fn is_attached(&self) -> bool {
        self.channel.is_open()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testutil::{CollectSink, MockBus};
    use std::thread;
    use std::time::Duration;

    fn port_with_bus() -> (Port, MockBus) {
        let bus = MockBus::new();
        (Port::new(0, Box::new(bus.clone())), bus)
    }

    #[test]
    fn test_name_follows_index() {
        let port = Port::new(3, Box::new(MockBus::new()));
        assert_eq!(port.name(), "ttySPI3");
        assert_eq!(port.index(), 3);
    }

    #[test]
    fn test_short_write_is_sent_whole() {
        let (port, bus) = port_with_bus();
        assert_eq!(port.write(b"hello").unwrap(), 5);

        let log = bus.transfers();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].tx, b"hello".to_vec());
        assert_eq!(log[0].speed_hz, 115_200);
    }

    #[test]
    fn test_write_of_exactly_cap() {
        let (port, bus) = port_with_bus();
        let buf = [0x55u8; MSG_LEN];
        assert_eq!(port.write(&buf).unwrap(), MSG_LEN);
        assert_eq!(bus.transfers()[0].tx.len(), MSG_LEN);
    }

    #[test]
    fn test_long_write_is_clamped() {
        let (port, bus) = port_with_bus();
        let buf: Vec<u8> = (0..200u32).map(|i| i as u8).collect();
        assert_eq!(port.write(&buf).unwrap(), 64);

        let log = bus.transfers();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].tx, buf[..64].to_vec());
    }

    #[test]
    fn test_empty_write_never_touches_bus() {
        let (port, bus) = port_with_bus();
        assert_eq!(port.write(&[]).unwrap(), 0);
        assert!(bus.transfers().is_empty());
    }

    #[test]
    fn test_write_ignores_transport_failure() {
        let (port, bus) = port_with_bus();
        bus.fail_next(1);
        assert_eq!(port.write(b"abc").unwrap(), 3);
    }

    #[test]
    fn test_write_never_feeds_sink() {
        let (port, bus) = port_with_bus();
        let collect = Arc::new(CollectSink::default());
        let sink: Arc<dyn ByteSink> = collect.clone();
        port.open(&sink);

        bus.queue_reply(&[0x00, b'X', b'Y']);
        port.write(b"abc").unwrap();
        assert!(collect.data().is_empty());
    }

    #[test]
    fn test_write_room_is_constant() {
        let (port, _bus) = port_with_bus();
        assert_eq!(port.write_room(), 64);
        port.write(&[1u8; 10]).unwrap();
        assert_eq!(port.write_room(), 64);
    }

    #[test]
    fn test_poll_sends_enquiry_and_delivers() {
        let (port, bus) = port_with_bus();
        let collect = Arc::new(CollectSink::default());
        let sink: Arc<dyn ByteSink> = collect.clone();
        port.open(&sink);

        bus.queue_reply(&[0x05, 0x41, 0x00, 0x42]);
        assert_eq!(port.poll().unwrap(), 2);
        assert_eq!(collect.data(), b"AB".to_vec());

        let log = bus.transfers();
        assert_eq!(log[0].tx.len(), 64);
        assert!(log[0].tx[..63].iter().all(|&b| b == 0x05));
        assert_eq!(log[0].tx[63], 0x00);
        assert_eq!(log[0].speed_hz, 9_600);
    }

    #[test]
    fn test_enquiry_identical_across_polls() {
        let (port, bus) = port_with_bus();
        port.poll().unwrap();
        port.poll().unwrap();
        let log = bus.transfers();
        assert_eq!(log[0].tx, log[1].tx);
    }

    #[test]
    fn test_poll_without_session() {
        let (port, bus) = port_with_bus();
        bus.queue_reply(&[0x00, b'z']);
        assert!(!port.is_open());
        assert_eq!(port.poll().unwrap(), 0);
        assert_eq!(bus.transfers().len(), 1);
    }

    #[test]
    fn test_concurrent_polls_deliver_in_exchange_order() {
        struct SlowSink(std::sync::Mutex<Vec<u8>>);

        impl ByteSink for SlowSink {
            fn receive(&self, data: &[u8]) {
                if data == b"A" {
                    thread::sleep(Duration::from_millis(100));
                }
                self.0.lock().unwrap().extend_from_slice(data);
            }
        }

        let (port, bus) = port_with_bus();
        bus.queue_reply(&[0x00, b'A']);
        bus.queue_reply(&[0x00, b'B']);
        let port = Arc::new(port);
        let slow = Arc::new(SlowSink(std::sync::Mutex::new(Vec::new())));
        let sink: Arc<dyn ByteSink> = slow.clone();
        port.open(&sink);

        let first = {
            let port = port.clone();
            thread::spawn(move || port.poll().unwrap())
        };
        thread::sleep(Duration::from_millis(20));
        let second = {
            let port = port.clone();
            thread::spawn(move || port.poll().unwrap())
        };
        first.join().unwrap();
        second.join().unwrap();

        assert_eq!(*slow.0.lock().unwrap(), b"AB".to_vec());
    }

    #[test]
    fn test_concurrent_poll_and_write_do_not_interleave() {
        let (port, bus) = port_with_bus();
        bus.hold_for(Duration::from_millis(2));
        let port = Arc::new(port);

        let writer = {
            let port = port.clone();
            thread::spawn(move || {
                for _ in 0..20 {
                    port.write(b"data").unwrap();
                }
            })
        };
        let poller = {
            let port = port.clone();
            thread::spawn(move || {
                for _ in 0..20 {
                    port.poll().unwrap();
                }
            })
        };
        writer.join().unwrap();
        poller.join().unwrap();

        assert_eq!(bus.overlaps(), 0);
        let log = bus.transfers();
        assert_eq!(log.len(), 40);
        for t in &log {
            match t.speed_hz {
                115_200 => assert_eq!(t.tx, b"data".to_vec()),
                9_600 => assert_eq!(t.tx, port.enquiry_pattern().as_bytes().to_vec()),
                other => panic!("unexpected clock {}", other),
            }
        }
    }

    #[test]
    fn test_released_port_rejects_io() {
        let (port, _bus) = port_with_bus();
        assert!(port.is_attached());
        assert!(port.release().is_some());
        assert!(!port.is_attached());
        assert!(matches!(port.write(b"x"), Err(Error::Detached)));
        assert!(matches!(port.poll(), Err(Error::Detached)));
    }
}
