//! Inbound filtering and delivery to the stream session
//!
//! The first byte of every received buffer is the peer's stale echo of the
//! previous transaction and is never payload. `0x00` bytes are padding. What
//! is left is pushed to the open session, if there is one.

use std::sync::{Arc, PoisonError, RwLock, Weak};

use crate::protocol::PAD;

/// Consumer of inbound stream data
///
/// Implemented by whatever plays the role of the open tty session. Each call
/// carries the payload of one transaction, in arrival order.
///
/// `receive` runs while the port's transaction lock is held, so it must not
/// write to the same port.
pub trait ByteSink: Send + Sync {
    /// Append `data` to the stream as normal characters
    fn receive(&self, data: &[u8]);
}

/// Strip the stale first byte and all padding from a received buffer
pub fn filter(rx: &[u8]) -> Vec<u8> {
    rx.iter().skip(1).copied().filter(|&b| b != PAD).collect()
}

/// Non-owning reference from a device to its open session
///
/// Set when a session opens and cleared when it closes. The session owns the
/// sink; if it goes away without closing, the reference simply stops
/// resolving.
#[derive(Default)]
pub struct SinkSlot {
    sink: RwLock<Option<Weak<dyn ByteSink>>>,
}

impl SinkSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the slot at `sink`
    pub fn set(&self, sink: &Arc<dyn ByteSink>) {
        *self.sink.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::downgrade(sink));
    }

    /// Forget the current sink
    pub fn clear(&self) {
        *self.sink.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// The sink, if one is set and still alive
    pub fn get(&self) -> Option<Arc<dyn ByteSink>> {
        self.sink
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(Weak::upgrade)
    }

    /// True if a live sink is set
    pub fn is_set(&self) -> bool {
        self.get().is_some()
    }

    /// Filter `rx` and push the result to the sink
    ///
    /// Returns the number of bytes delivered. With no sink the data is
    /// dropped, not buffered.
    pub fn deliver(&self, rx: &[u8]) -> usize {
        let Some(sink) = self.get() else {
            log::trace!("spi_tty: no open session, dropping {} bytes", rx.len());
            return 0;
        };

        let data = filter(rx);
        if !data.is_empty() {
            sink.receive(&data);
        }
        data.len()
    }
}

impl std::fmt::Debug for SinkSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkSlot")
            .field("set", &self.is_set())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::CollectSink;

    #[test]
    fn test_filter_drops_echo_and_padding() {
        assert_eq!(filter(&[0x05, 0x41, 0x00, 0x42]), b"AB".to_vec());
    }

    #[test]
    fn test_filter_first_byte_always_dropped() {
        assert_eq!(filter(&[0x41]), Vec::<u8>::new());
        assert_eq!(filter(&[0x41, 0x41]), vec![0x41]);
        assert_eq!(filter(&[]), Vec::<u8>::new());
    }

    #[test]
    fn test_filter_keeps_order_and_non_padding() {
        let rx = [0x00, 0x05, 0x00, 0xFF, 0x0A, 0x00, 0x00, 0x31];
        assert_eq!(filter(&rx), vec![0x05, 0xFF, 0x0A, 0x31]);
    }

    #[test]
    fn test_deliver_without_sink_is_noop() {
        let slot = SinkSlot::new();
        assert!(!slot.is_set());
        assert_eq!(slot.deliver(&[0x05, 0x41]), 0);
    }

    #[test]
    fn test_deliver_appends_in_order() {
        let collect = Arc::new(CollectSink::default());
        let sink: Arc<dyn ByteSink> = collect.clone();
        let slot = SinkSlot::new();
        slot.set(&sink);

        assert_eq!(slot.deliver(&[0x05, b'h', 0x00, b'i']), 2);
        assert_eq!(slot.deliver(&[0x00, 0x00, 0x00]), 0);
        assert_eq!(slot.deliver(&[0x00, b'!']), 1);

        assert_eq!(collect.data(), b"hi!".to_vec());
        // Empty payloads are not pushed
        assert_eq!(collect.calls(), 2);
    }

    #[test]
    fn test_cleared_slot_drops_data() {
        let collect = Arc::new(CollectSink::default());
        let sink: Arc<dyn ByteSink> = collect.clone();
        let slot = SinkSlot::new();
        slot.set(&sink);
        slot.clear();

        assert_eq!(slot.deliver(&[0x00, b'x']), 0);
        assert!(collect.data().is_empty());
    }

    #[test]
    fn test_slot_does_not_keep_sink_alive() {
        let slot = SinkSlot::new();
        {
            let sink: Arc<dyn ByteSink> = Arc::new(CollectSink::default());
            slot.set(&sink);
            assert!(slot.is_set());
        }
        assert!(!slot.is_set());
        assert_eq!(slot.deliver(&[0x00, b'x']), 0);
    }
}
