use avr_device::atmega128a::PORTE;
use avr_device::interrupt;
use core::convert::Infallible;
use core::marker::PhantomData;
use embedded_hal::digital::v2::OutputPin;

pub trait PinMode {}
pub struct Input;
pub struct Output;
impl PinMode for Input {}
impl PinMode for Output {}

pub struct Pin<PORT, const P: u8, MODE> {
    _port: PhantomData<PORT>,
    _mode: PhantomData<MODE>,
}

impl<PORT, const P: u8> Pin<PORT, P, Input> {
    /// Every pin comes out of reset as an input. The caller must own `PORT`.
    unsafe fn new() -> Self {
        Pin {
            _port: PhantomData,
            _mode: PhantomData,
        }
    }
}

macro_rules! impl_port {
    ($PORT:ident, $port:ident, $ddr:ident) => {
        impl<const P: u8, MODE: PinMode> Pin<$PORT, P, MODE> {
            pub fn into_output(self) -> Pin<$PORT, P, Output> {
                interrupt::free(|_| unsafe {
                    (*$PORT::ptr()).$ddr.modify(|r, w| w.bits(r.bits() | (1 << P)));
                });
                Pin {
                    _port: PhantomData,
                    _mode: PhantomData,
                }
            }
        }

        impl<const P: u8> OutputPin for Pin<$PORT, P, Output> {
            type Error = Infallible;

            fn set_high(&mut self) -> Result<(), Infallible> {
                interrupt::free(|_| unsafe {
                    (*$PORT::ptr()).$port.modify(|r, w| w.bits(r.bits() | (1 << P)));
                });
                Ok(())
            }

            fn set_low(&mut self) -> Result<(), Infallible> {
                interrupt::free(|_| unsafe {
                    (*$PORT::ptr()).$port.modify(|r, w| w.bits(r.bits() & !(1 << P)));
                });
                Ok(())
            }
        }
    };
}

impl_port!(PORTE, porte, ddre);

// Programmer board pin assignments
pub mod board {
    use super::*;

    /// Target RST, active high on the AT89LP
    pub type TargetReset = Pin<PORTE, 2, Output>;

    pub fn target_reset(_porte: PORTE) -> TargetReset {
        let mut pin = unsafe { Pin::<PORTE, 2, Input>::new() }.into_output();
        pin.set_low().ok();
        pin
    }
}
