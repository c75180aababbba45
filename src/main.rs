#![cfg_attr(target_arch = "avr", no_std)]
#![cfg_attr(target_arch = "avr", no_main)]

#[cfg(target_arch = "avr")]
mod firmware {
    use avr_device::atmega128a::Peripherals;
    use panic_halt as _;

    use at89_programmer::config::Limits;
    use at89_programmer::drivers::{DeviceLink, HostLink, Target};
    use at89_programmer::hal::gpio::board;
    use at89_programmer::hal::spi::{SpiPort, DEVICE};
    use at89_programmer::hal::timer::Delay;
    use at89_programmer::hal::uart::{Usart0Port, HOST};
    use at89_programmer::Programmer;

    #[avr_device::entry]
    fn main() -> ! {
        let dp = Peripherals::take().unwrap();

        let delay = Delay::new(dp.TC0);
        let limits = Limits::default();
        let host = HostLink::new(Usart0Port::new(dp.USART0), &HOST);
        let link = DeviceLink::new(SpiPort::new(dp.SPI, dp.PORTB), delay, &DEVICE, limits);
        let reset = board::target_reset(dp.PORTE);

        unsafe { avr_device::interrupt::enable() };

        Programmer::new(host, Target::new(link, limits), reset, delay).run()
    }
}

#[cfg(not(target_arch = "avr"))]
fn main() {
    eprintln!("at89_programmer only runs on the ATmega128; run the tests instead");
}
