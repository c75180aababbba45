//! SPI master as the device port. Mode 0, MSB first, fosc/4.
//!
//! PB0 is select, PB1..PB3 are SCK, MOSI and MISO.

use avr_device::atmega128a::{PORTB, SPI};
use avr_device::interrupt;

use super::irq::{Irq, IrqControl};
use super::port::DevicePort;
use crate::drivers::DeviceShared;

const SS: u8 = 1 << 0;
const SCK: u8 = 1 << 1;
const MOSI: u8 = 1 << 2;

// SPCR
const MSTR: u8 = 1 << 4;
const SPE: u8 = 1 << 6;
const SPIE: u8 = 1 << 7;

/// Device link state reached from the transfer-complete interrupt.
pub static DEVICE: DeviceShared = DeviceShared::new();

pub struct SpiPort {
    spi: SPI,
    portb: PORTB,
}

impl SpiPort {
    pub fn new(spi: SPI, portb: PORTB) -> Self {
        unsafe {
            // Select idles high, and must be an output for master mode to stick.
            portb.portb.modify(|r, w| w.bits(r.bits() | SS));
            portb.ddrb.modify(|r, w| w.bits(r.bits() | SS | SCK | MOSI));
            spi.spcr.write(|w| w.bits(SPIE | SPE | MSTR));
        }
        Self { spi, portb }
    }
}

impl IrqControl for SpiPort {
    fn disable(&mut self, irq: Irq) {
        if irq == Irq::Device {
            interrupt::free(|_| unsafe {
                self.spi.spcr.modify(|r, w| w.bits(r.bits() & !SPIE));
            });
        }
    }

    fn enable(&mut self, irq: Irq) {
        if irq == Irq::Device {
            interrupt::free(|_| unsafe {
                self.spi.spcr.modify(|r, w| w.bits(r.bits() | SPIE));
            });
        }
    }
}

impl DevicePort for SpiPort {
    fn transmit(&mut self, byte: u8) {
        unsafe { self.spi.spdr.write(|w| w.bits(byte)) }
    }

    fn set_select(&mut self, asserted: bool) {
        interrupt::free(|_| unsafe {
            self.portb.portb.modify(|r, w| {
                if asserted {
                    w.bits(r.bits() & !SS)
                } else {
                    w.bits(r.bits() | SS)
                }
            });
        });
    }

    fn set_attached(&mut self, attached: bool) {
        interrupt::free(|_| unsafe {
            if attached {
                self.portb.ddrb.modify(|r, w| w.bits(r.bits() | SCK | MOSI));
                self.spi.spcr.modify(|r, w| w.bits(r.bits() | SPE));
            } else {
                self.spi.spcr.modify(|r, w| w.bits(r.bits() & !SPE));
                self.portb.ddrb.modify(|r, w| w.bits(r.bits() & !(SCK | MOSI)));
                self.portb.portb.modify(|r, w| w.bits(r.bits() & !(SCK | MOSI)));
            }
        });
    }
}

#[avr_device::interrupt(atmega128a)]
fn SPI_STC() {
    let spi = unsafe { &*SPI::ptr() };
    let reply = spi.spdr.read().bits();
    let done = DEVICE.on_transfer_complete(reply);
    if done.release_select {
        unsafe { (*PORTB::ptr()).portb.modify(|r, w| w.bits(r.bits() | SS)) };
    }
    if let Some(byte) = done.next {
        unsafe { spi.spdr.write(|w| w.bits(byte)) };
    }
}
