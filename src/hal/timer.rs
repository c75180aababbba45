use avr_device::atmega128a::TC0;
use core::marker::PhantomData;
use embedded_hal::blocking::delay::{DelayMs, DelayUs};

/// TC0 clock select. TC0 has its own prescaler table on this part.
#[derive(Clone, Copy)]
enum Prescaler {
    Stop = 0,
    Direct = 1,
    Div64 = 4,
}

/// Busy-wait delays on TC0.
///
/// Only the foreground loop delays, and never from inside another delay,
/// so copies share the timer freely.
#[derive(Clone, Copy)]
pub struct Delay {
    _timer: PhantomData<TC0>,
}

impl Delay {
    pub fn new(_tc0: TC0) -> Self {
        let mut delay = Self {
            _timer: PhantomData,
        };
        delay.start(Prescaler::Stop);
        delay
    }

    fn start(&mut self, prescaler: Prescaler) {
        unsafe {
            let p = TC0::ptr();
            (*p).tccr0.write(|w| w.bits(prescaler as u8));
        }
    }

    fn set_counter(&mut self, value: u8) {
        unsafe { (*TC0::ptr()).tcnt0.write(|w| w.bits(value)) }
    }

    fn counter(&self) -> u8 {
        unsafe { (*TC0::ptr()).tcnt0.read().bits() }
    }

    /// `periods` rounds of `ticks` timer counts.
    fn wait(&mut self, prescaler: Prescaler, ticks: u8, periods: u8) {
        self.set_counter(0);
        self.start(prescaler);
        for _ in 0..periods {
            while self.counter() < ticks {}
            self.set_counter(0);
        }
        self.start(Prescaler::Stop);
    }
}

impl DelayMs<u8> for Delay {
    // 16 MHz / 64 = 250 kHz, 250 ticks per millisecond
    fn delay_ms(&mut self, ms: u8) {
        self.wait(Prescaler::Div64, 250, ms);
    }
}

impl DelayUs<u8> for Delay {
    fn delay_us(&mut self, us: u8) {
        self.wait(Prescaler::Direct, 16, us);
    }
}
