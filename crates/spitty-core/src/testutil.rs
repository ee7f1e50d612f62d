//! Shared test doubles

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::sink::ByteSink;
use crate::transport::{SpiTransport, Transfer};

/// One exchange as seen by [`MockBus`]
#[derive(Debug, Clone)]
pub struct Recorded {
    pub tx: Vec<u8>,
    pub speed_hz: u32,
    pub delay_us: u16,
}

#[derive(Default)]
struct MockState {
    transfers: Vec<Recorded>,
    replies: VecDeque<Vec<u8>>,
    fail: usize,
    hold: Duration,
    overlaps: usize,
}

/// Recording transport with canned replies and overlap detection
#[derive(Clone, Default)]
pub struct MockBus {
    state: Arc<Mutex<MockState>>,
    busy: Arc<AtomicBool>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_reply(&self, reply: &[u8]) {
        self.state.lock().unwrap().replies.push_back(reply.to_vec());
    }

    pub fn fail_next(&self, n: usize) {
        self.state.lock().unwrap().fail = n;
    }

    pub fn hold_for(&self, hold: Duration) {
        self.state.lock().unwrap().hold = hold;
    }

    /// Live clones of this bus, including the one under test
    pub fn handles(&self) -> usize {
        Arc::strong_count(&self.state)
    }

    pub fn transfers(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().transfers.clone()
    }

    pub fn overlaps(&self) -> usize {
        self.state.lock().unwrap().overlaps
    }
}

impl SpiTransport for MockBus {
    fn exchange(&mut self, xfer: &mut Transfer<'_>) -> Result<()> {
        if self.busy.swap(true, Ordering::SeqCst) {
            self.state.lock().unwrap().overlaps += 1;
        }

        let (hold, fail) = {
            let mut st = self.state.lock().unwrap();
            st.transfers.push(Recorded {
                tx: xfer.tx.to_vec(),
                speed_hz: xfer.speed_hz,
                delay_us: xfer.delay_us,
            });
            if let Some(reply) = st.replies.pop_front() {
                let n = reply.len().min(xfer.rx.len());
                xfer.rx[..n].copy_from_slice(&reply[..n]);
            }
            let fail = st.fail > 0;
            if fail {
                st.fail -= 1;
            }
            (st.hold, fail)
        };

        if !hold.is_zero() {
            std::thread::sleep(hold);
        }
        self.busy.store(false, Ordering::SeqCst);

        if fail {
            return Err(Error::Transfer(std::io::Error::other("injected fault")));
        }
        Ok(())
    }
}

/// Sink that keeps everything it is given
#[derive(Default)]
pub struct CollectSink {
    data: Mutex<Vec<u8>>,
    calls: Mutex<usize>,
}

impl CollectSink {
    pub fn data(&self) -> Vec<u8> {
        self.data.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl ByteSink for CollectSink {
    fn receive(&self, data: &[u8]) {
        self.data.lock().unwrap().extend_from_slice(data);
        *self.calls.lock().unwrap() += 1;
    }
}
