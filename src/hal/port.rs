//! Hardware seams of the two links.
//!
//! The drivers only ever start a transfer, mask their interrupt and wait;
//! everything else happens in the interrupt bodies on the shared state.

use super::irq::IrqControl;

/// Host serial peripheral.
pub trait HostPort: IrqControl {
    /// Load the transmit data register.
    fn transmit(&mut self, byte: u8);

    /// Called on every iteration of a foreground busy wait.
    #[inline]
    fn relax(&mut self) {}
}

/// Synchronous link to the target plus its control lines.
pub trait DevicePort: IrqControl {
    /// Load the shift register; the reply arrives with the completion interrupt.
    fn transmit(&mut self, byte: u8);

    /// Drive the select line, active low on the wire.
    fn set_select(&mut self, asserted: bool);

    /// Connect the clock and data pins to the link, or leave them floating.
    fn set_attached(&mut self, attached: bool);

    /// Called on every iteration of a foreground busy wait.
    #[inline]
    fn relax(&mut self) {}
}
