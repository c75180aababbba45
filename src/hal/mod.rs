pub mod irq;
pub mod port;
pub mod spin;

#[cfg(target_arch = "avr")]
pub mod gpio;
#[cfg(target_arch = "avr")]
pub mod spi;
#[cfg(target_arch = "avr")]
pub mod timer;
#[cfg(target_arch = "avr")]
pub mod uart;

// Re-export commonly used types
pub use irq::{Irq, IrqCell, IrqControl};
pub use port::{DevicePort, HostPort};
pub use spin::{Budget, Stalled};
