//! Inbound host queue, filled only by the receive interrupt.

use super::ring::ByteRing;

/// Receive problems seen by the interrupt since the last foreground check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RxFaults {
    /// The queue was full and a byte was dropped
    pub overflow: bool,
    /// The peripheral lost a byte before the interrupt could read it
    pub overrun: bool,
}

impl RxFaults {
    pub fn any(&self) -> bool {
        self.overflow || self.overrun
    }
}

pub struct RxQueue<const N: usize> {
    ring: ByteRing<N>,
    faults: RxFaults,
}

impl<const N: usize> RxQueue<N> {
    pub const fn new() -> Self {
        Self {
            ring: ByteRing::new(),
            faults: RxFaults {
                overflow: false,
                overrun: false,
            },
        }
    }

    /// Interrupt side. A full queue saturates and flags the loss.
    pub fn push(&mut self, byte: u8, overrun: bool) {
        if overrun {
            self.faults.overrun = true;
        }
        if self.ring.push(byte).is_err() {
            self.faults.overflow = true;
        }
    }

    pub fn pop(&mut self) -> Option<u8> {
        self.ring.pop()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Returns and clears the fault flags.
    pub fn take_faults(&mut self) -> RxFaults {
        core::mem::take(&mut self.faults)
    }

    pub fn reset(&mut self) {
        self.ring.clear();
        self.faults = RxFaults::default();
    }
}

impl<const N: usize> Default for RxQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
