//! USART0 as the host port, 57600 8N1 in double-speed mode.

use avr_device::atmega128a::USART0;
use avr_device::interrupt;

use super::irq::{Irq, IrqControl};
use super::port::HostPort;
use crate::config::{CPU_FREQ_HZ, HOST_BAUD};
use crate::drivers::HostShared;

// UCSR0A
const U2X: u8 = 1 << 1;
const DOR: u8 = 1 << 3;
// UCSR0B
const TXEN: u8 = 1 << 3;
const RXEN: u8 = 1 << 4;
const UDRIE: u8 = 1 << 5;
const RXCIE: u8 = 1 << 7;
// UCSR0C: 8 data bits
const UCSZ_8BIT: u8 = 0b11 << 1;

// Rounded divisor for double-speed mode
const UBRR: u16 = ((CPU_FREQ_HZ + 4 * HOST_BAUD) / (8 * HOST_BAUD) - 1) as u16;

/// Host link state reached from the serial interrupts.
pub static HOST: HostShared = HostShared::new();

pub struct Usart0Port {
    usart: USART0,
}

impl Usart0Port {
    pub fn new(usart: USART0) -> Self {
        unsafe {
            usart.ubrr0h.write(|w| w.bits((UBRR >> 8) as u8));
            usart.ubrr0l.write(|w| w.bits(UBRR as u8));
            usart.ucsr0a.write(|w| w.bits(U2X));
            usart.ucsr0c.write(|w| w.bits(UCSZ_8BIT));
            usart.ucsr0b.write(|w| w.bits(RXEN | TXEN | RXCIE));
        }
        Self { usart }
    }

    fn enable_bit(irq: Irq) -> u8 {
        match irq {
            Irq::HostTx => UDRIE,
            Irq::HostRx => RXCIE,
            Irq::Device => 0,
        }
    }
}

impl IrqControl for Usart0Port {
    fn disable(&mut self, irq: Irq) {
        let bit = Self::enable_bit(irq);
        interrupt::free(|_| unsafe {
            self.usart.ucsr0b.modify(|r, w| w.bits(r.bits() & !bit));
        });
    }

    // Re-enabling UDRIE with nothing queued costs one empty interrupt,
    // which clears it again.
    fn enable(&mut self, irq: Irq) {
        let bit = Self::enable_bit(irq);
        interrupt::free(|_| unsafe {
            self.usart.ucsr0b.modify(|r, w| w.bits(r.bits() | bit));
        });
    }
}

impl HostPort for Usart0Port {
    fn transmit(&mut self, byte: u8) {
        unsafe { self.usart.udr0.write(|w| w.bits(byte)) }
    }
}

#[avr_device::interrupt(atmega128a)]
fn USART0_RX() {
    let usart = unsafe { &*USART0::ptr() };
    // DOR must be sampled before UDR0 is read.
    let overrun = usart.ucsr0a.read().bits() & DOR != 0;
    let byte = usart.udr0.read().bits();
    HOST.on_receive(byte, overrun);
}

#[avr_device::interrupt(atmega128a)]
fn USART0_UDRE() {
    let usart = unsafe { &*USART0::ptr() };
    match HOST.on_tx_ready() {
        Some(byte) => unsafe { usart.udr0.write(|w| w.bits(byte)) },
        None => unsafe { usart.ucsr0b.modify(|r, w| w.bits(r.bits() & !UDRIE)) },
    }
}
