//! Transmit side of a link: a ring plus the idle flag of the peripheral.

use super::ring::ByteRing;

/// What the producer has to do after offering a byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueue {
    /// Channel was idle: load this byte into the peripheral now.
    Start(u8),
    /// Byte waits in the ring; the interrupt will send it.
    Queued,
    /// Ring is full; the byte was not taken.
    Full(u8),
}

/// Outbound ring with the transmitter's idle state.
///
/// The ring is only ever non-empty while the channel is busy: an idle
/// channel bypasses it.
pub struct TxChannel<const N: usize> {
    ring: ByteRing<N>,
    idle: bool,
}

impl<const N: usize> TxChannel<N> {
    pub const fn new() -> Self {
        Self {
            ring: ByteRing::new(),
            idle: true,
        }
    }

    /// Foreground side. Must run with the transmit interrupt masked.
    pub fn enqueue(&mut self, byte: u8) -> Enqueue {
        if self.idle {
            self.idle = false;
            return Enqueue::Start(byte);
        }
        match self.ring.push(byte) {
            Ok(()) => Enqueue::Queued,
            Err(byte) => Enqueue::Full(byte),
        }
    }

    /// Interrupt side: the peripheral can take another byte.
    pub fn on_tx_ready(&mut self) -> Option<u8> {
        let next = self.ring.pop();
        if next.is_none() {
            self.idle = true;
        }
        next
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.idle
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.ring.is_full()
    }

    /// Bytes waiting behind the one in flight.
    #[inline]
    pub fn pending(&self) -> usize {
        self.ring.len()
    }

    pub fn reset(&mut self) {
        self.ring.clear();
        self.idle = true;
    }
}

impl<const N: usize> Default for TxChannel<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_channel_bypasses_the_ring() {
        let mut tx = TxChannel::<4>::new();
        assert_eq!(tx.enqueue(0x41), Enqueue::Start(0x41));
        assert!(!tx.is_idle());
        assert_eq!(tx.pending(), 0);
    }

    #[test]
    fn busy_channel_queues_until_full() {
        let mut tx = TxChannel::<2>::new();
        assert_eq!(tx.enqueue(1), Enqueue::Start(1));
        assert_eq!(tx.enqueue(2), Enqueue::Queued);
        assert_eq!(tx.enqueue(3), Enqueue::Queued);
        assert_eq!(tx.enqueue(4), Enqueue::Full(4));
        assert!(tx.is_full());
    }

    #[test]
    fn interrupt_drains_fifo_then_goes_idle() {
        let mut tx = TxChannel::<4>::new();
        tx.enqueue(1);
        tx.enqueue(2);
        tx.enqueue(3);

        assert_eq!(tx.on_tx_ready(), Some(2));
        assert_eq!(tx.on_tx_ready(), Some(3));
        assert!(!tx.is_idle());
        assert_eq!(tx.on_tx_ready(), None);
        assert!(tx.is_idle());

        // Back on the fast path.
        assert_eq!(tx.enqueue(9), Enqueue::Start(9));
    }

    #[test]
    fn full_ring_frees_a_slot_after_one_drain() {
        let mut tx = TxChannel::<1>::new();
        tx.enqueue(1);
        tx.enqueue(2);
        assert_eq!(tx.enqueue(3), Enqueue::Full(3));
        assert_eq!(tx.on_tx_ready(), Some(2));
        assert_eq!(tx.enqueue(3), Enqueue::Queued);
        assert_eq!(tx.on_tx_ready(), Some(3));
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut tx = TxChannel::<4>::new();
        tx.enqueue(1);
        tx.enqueue(2);
        tx.reset();
        assert!(tx.is_idle());
        assert_eq!(tx.pending(), 0);
    }
}
