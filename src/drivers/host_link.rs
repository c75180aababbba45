//! Flow-controlled host serial link.

use core::convert::Infallible;

use embedded_hal::serial;

use crate::config::{HOST_RX_CAPACITY, HOST_TX_CAPACITY, XOFF, XON};
use crate::hal::{HostPort, Irq, IrqCell};
use crate::transport::{Enqueue, RxFaults, RxQueue, TxChannel};

/// Host link state shared with the serial interrupts.
pub struct HostShared {
    tx: IrqCell<TxChannel<HOST_TX_CAPACITY>>,
    rx: IrqCell<RxQueue<HOST_RX_CAPACITY>>,
}

impl HostShared {
    pub const fn new() -> Self {
        Self {
            tx: IrqCell::new(Irq::HostTx, TxChannel::new()),
            rx: IrqCell::new(Irq::HostRx, RxQueue::new()),
        }
    }

    /// Transmitter-ready interrupt body. `None` means the link went idle.
    pub fn on_tx_ready(&self) -> Option<u8> {
        self.tx.isr(|tx| tx.on_tx_ready())
    }

    /// Receive interrupt body.
    pub fn on_receive(&self, byte: u8, overrun: bool) {
        self.rx.isr(|rx| rx.push(byte, overrun));
    }
}

impl Default for HostShared {
    fn default() -> Self {
        Self::new()
    }
}

pub struct HostLink<'a, P> {
    port: P,
    shared: &'a HostShared,
}

impl<'a, P: HostPort> HostLink<'a, P> {
    pub fn new(port: P, shared: &'a HostShared) -> Self {
        Self { port, shared }
    }

    /// Drop everything queued in both directions.
    pub fn reset(&mut self) {
        self.shared.tx.lock(&mut self.port, |tx, _| tx.reset());
        self.shared.rx.lock(&mut self.port, |rx, _| rx.reset());
    }

    /// Queue one byte, spinning while the ring is full.
    pub fn write_byte(&mut self, byte: u8) {
        loop {
            let taken = self.shared.tx.lock(&mut self.port, |tx, port| match tx.enqueue(byte) {
                Enqueue::Start(byte) => {
                    port.transmit(byte);
                    true
                }
                Enqueue::Queued => true,
                Enqueue::Full(_) => false,
            });
            if taken {
                return;
            }
            self.port.relax();
        }
    }

    pub fn write_str(&mut self, s: &str) {
        for byte in s.bytes() {
            self.write_byte(byte);
        }
    }

    /// Two uppercase hex digits.
    pub fn write_hex(&mut self, val: u8) {
        const HEX_CHARS: [u8; 16] = *b"0123456789ABCDEF";
        self.write_byte(HEX_CHARS[(val >> 4) as usize]);
        self.write_byte(HEX_CHARS[(val & 0xF) as usize]);
    }

    /// Ask the host to stop sending.
    pub fn pause(&mut self) {
        self.write_byte(XOFF);
    }

    /// Let the host continue sending.
    pub fn resume(&mut self) {
        self.write_byte(XON);
    }

    /// Spin until every queued byte has been handed to the peripheral.
    pub fn flush(&mut self) {
        while !self.shared.tx.lock(&mut self.port, |tx, _| tx.is_idle()) {
            self.port.relax();
        }
    }

    /// Block until the host sends a byte.
    pub fn read_byte(&mut self) -> u8 {
        loop {
            match serial::Read::read(self) {
                Ok(byte) => return byte,
                Err(nb::Error::WouldBlock) => self.port.relax(),
                Err(nb::Error::Other(never)) => match never {},
            }
        }
    }

    /// Discard input until `byte` arrives.
    pub fn wait_for(&mut self, byte: u8) {
        while self.read_byte() != byte {}
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    fn report(&mut self, faults: RxFaults) {
        if faults.overflow {
            log::warn!("host receive queue overflowed");
            self.write_str("\r\nRX RING OVERFLOW.\r\n");
        }
        if faults.overrun {
            log::warn!("host receiver overrun");
            self.write_str("\r\nRX BUFFER OVERFLOW.\r\n");
        }
    }
}

impl<'a, P: HostPort> serial::Read<u8> for HostLink<'a, P> {
    type Error = Infallible;

    fn read(&mut self) -> nb::Result<u8, Infallible> {
        let (byte, faults) = self
            .shared
            .rx
            .lock(&mut self.port, |rx, _| (rx.pop(), rx.take_faults()));
        if faults.any() {
            self.report(faults);
        }
        byte.ok_or(nb::Error::WouldBlock)
    }
}

impl<'a, P: HostPort> ufmt::uWrite for HostLink<'a, P> {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
        HostLink::write_str(self, s);
        Ok(())
    }
}
